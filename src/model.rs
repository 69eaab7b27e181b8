use chrono::{Datelike, Months, NaiveDate};

use crate::schema::ColumnSchema;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
}

/// One scheduled event, independent of the source it was read from.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CanonicalRecord {
    pub event_date: NaiveDate,
    pub title: String,
    pub primary_person: String,
    pub location: String,
    pub presider: String,
    pub reader: String,
    pub hospitality_note: String,
}

impl CanonicalRecord {
    pub fn new(event_date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            event_date,
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Inclusive on both ends. An inverted range selects nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// First day of `today`'s month through the last day of the month `months`
    /// months later.
    pub fn months_ahead(today: NaiveDate, months: u32) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        let end = start
            .checked_add_months(Months::new(months.saturating_add(1)))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleClass {
    OrdinaryEven,
    OrdinaryOdd,
    Special,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutInstruction {
    TitleBand {
        text: String,
    },
    MonthHeaderBand {
        label: &'static str,
    },
    RowBand {
        record: CanonicalRecord,
        /// Display text per schema column, in column order.
        cells: Vec<String>,
        height: f32,
        style: StyleClass,
    },
}

/// An instruction stream together with the schema every band was laid out for.
#[derive(Clone, Debug)]
pub struct Layout {
    pub schema: ColumnSchema,
    pub instructions: Vec<LayoutInstruction>,
}

impl Layout {
    pub fn month_headers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.instructions.iter().filter_map(|ins| match ins {
            LayoutInstruction::MonthHeaderBand { label } => Some(*label),
            _ => None,
        })
    }

    pub fn row_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|ins| matches!(ins, LayoutInstruction::RowBand { .. }))
            .count()
    }
}
