use std::borrow::Cow;

use crate::dates::day_label;
use crate::layout::classify::is_special;
use crate::model::{Alignment, CanonicalRecord};

/// Points per millimetre.
pub(crate) const MM: f32 = 72.0 / 25.4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnId {
    Date,
    /// Talk title only.
    Talk,
    /// Talk title followed by an indented "speaker — congregation" line.
    TalkWithAttribution,
    Speaker,
    Congregation,
    Presider,
    Reader,
    Hospitality,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaVariant {
    /// Five columns, speaker folded into the talk cell, hospitality column.
    Hospitality,
    /// Six columns, separate speaker and congregation, no hospitality.
    Speakers,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub id: ColumnId,
    pub header: &'static str,
    pub width: f32,
    pub alignment: Alignment,
}

impl Column {
    fn new(id: ColumnId, header: &'static str, width_mm: f32, alignment: Alignment) -> Self {
        Self {
            id,
            header,
            width: width_mm * MM,
            alignment,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSchema {
    variant: SchemaVariant,
    columns: Vec<Column>,
}

impl ColumnSchema {
    pub fn hospitality() -> Self {
        use Alignment::*;
        Self {
            variant: SchemaVariant::Hospitality,
            columns: vec![
                Column::new(ColumnId::Date, "", 11.0, Center),
                Column::new(ColumnId::TalkWithAttribution, "Discurso", 100.0, Left),
                Column::new(ColumnId::Presider, "Presidente", 31.0, Center),
                Column::new(ColumnId::Reader, "Leitor", 28.0, Center),
                Column::new(ColumnId::Hospitality, "Hospitalidade", 36.0, Center),
            ],
        }
    }

    pub fn speakers() -> Self {
        use Alignment::*;
        Self {
            variant: SchemaVariant::Speakers,
            columns: vec![
                Column::new(ColumnId::Date, "", 11.0, Center),
                Column::new(ColumnId::Talk, "Discurso", 70.0, Left),
                Column::new(ColumnId::Speaker, "Orador", 36.0, Center),
                Column::new(ColumnId::Congregation, "Congregação", 33.0, Center),
                Column::new(ColumnId::Presider, "Presidente", 28.0, Center),
                Column::new(ColumnId::Reader, "Leitor", 28.0, Center),
            ],
        }
    }

    pub fn for_variant(variant: SchemaVariant) -> Self {
        match variant {
            SchemaVariant::Hospitality => Self::hospitality(),
            SchemaVariant::Speakers => Self::speakers(),
        }
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn total_width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    /// Display text of every column for one record, in column order.
    pub fn cell_texts(&self, record: &CanonicalRecord) -> Vec<String> {
        self.columns
            .iter()
            .map(|col| cell_text(record, col.id).into_owned())
            .collect()
    }

    /// Every (text, width) pair that takes part in sizing a row: the visible
    /// cells plus, for the combined talk cell, the bare title and congregation
    /// at the talk width.
    pub(crate) fn measured_cells<'r>(&self, record: &'r CanonicalRecord) -> Vec<(Cow<'r, str>, f32)> {
        let mut cells = Vec::with_capacity(self.columns.len() + 2);
        for col in &self.columns {
            if col.id == ColumnId::TalkWithAttribution {
                cells.push((Cow::Borrowed(record.title.as_str()), col.width));
                cells.push((Cow::Borrowed(record.location.as_str()), col.width));
            }
            cells.push((cell_text(record, col.id), col.width));
        }
        cells
    }
}

fn talk_text(title: &str) -> String {
    let stripped: String = title.chars().filter(|c| !matches!(c, '"' | '\'')).collect();
    if is_special(title) {
        stripped
    } else {
        format!("\"{stripped}\"")
    }
}

pub fn cell_text(record: &CanonicalRecord, id: ColumnId) -> Cow<'_, str> {
    match id {
        ColumnId::Date => Cow::Owned(day_label(record.event_date)),
        ColumnId::Talk => Cow::Owned(talk_text(&record.title)),
        ColumnId::TalkWithAttribution => {
            let mut text = talk_text(&record.title);
            text.push_str("\n    ");
            text.push_str(&record.primary_person);
            if !record.location.is_empty() {
                text.push_str(" — ");
                text.push_str(&record.location);
            }
            Cow::Owned(text)
        }
        ColumnId::Speaker => Cow::Borrowed(&record.primary_person),
        ColumnId::Congregation => Cow::Borrowed(&record.location),
        ColumnId::Presider => Cow::Borrowed(&record.presider),
        ColumnId::Reader => Cow::Borrowed(&record.reader),
        ColumnId::Hospitality => Cow::Borrowed(&record.hospitality_note),
    }
}
