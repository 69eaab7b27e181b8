//! Source rows and their mapping onto [`CanonicalRecord`].
//!
//! A raw row is the ordered list of cell strings one reader produced. Each
//! [`SourceFormat`] fixes which positions hold which field and how the date
//! is written.

pub mod flat_file;
pub mod xlsx;

use std::path::Path;

use crate::dates::{FLAT_FILE_DATE, SPREADSHEET_DATE, parse_date};
use crate::error::Error;
use crate::model::CanonicalRecord;

pub type RawRow = Vec<String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    /// Spreadsheet range: date, talk, speaker, congregation, chairman, reader.
    /// Dates as day/month/year.
    Spreadsheet,
    /// Scheduling-software CSV export. Dates as year-month-day.
    FlatFile,
}

struct FieldMap {
    date: usize,
    title: usize,
    speaker: usize,
    congregation: usize,
    presider: usize,
    reader: usize,
    hospitality: Option<usize>,
    date_pattern: &'static str,
}

impl SourceFormat {
    fn fields(self) -> FieldMap {
        match self {
            SourceFormat::Spreadsheet => FieldMap {
                date: 0,
                title: 1,
                speaker: 2,
                congregation: 3,
                presider: 4,
                reader: 5,
                hospitality: None,
                date_pattern: SPREADSHEET_DATE,
            },
            // Date,Congregation,PublicSpeaker,OutlineNumber,OutlineName,Song,
            // SpeakerConfirmed,AvailableForHospitality,Notes,Chairman,
            // WatchtowerReader,CustomWeekendAssignment1,CustomWeekendAssignment2,Hospitality
            SourceFormat::FlatFile => FieldMap {
                date: 0,
                title: 4,
                speaker: 2,
                congregation: 1,
                presider: 9,
                reader: 10,
                hospitality: Some(13),
                date_pattern: FLAT_FILE_DATE,
            },
        }
    }

    /// Guess the format from a file extension: `.xlsx` is a spreadsheet,
    /// anything else is read as a flat file.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => SourceFormat::Spreadsheet,
            _ => SourceFormat::FlatFile,
        }
    }
}

fn field(row: &[String], idx: usize) -> String {
    row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Map one raw row to a record. Returns `None` when the date does not parse.
pub fn normalize(row: &[String], format: SourceFormat) -> Option<CanonicalRecord> {
    let map = format.fields();
    let raw_date = row.get(map.date)?;
    let event_date = parse_date(raw_date, map.date_pattern)?;
    Some(CanonicalRecord {
        event_date,
        title: field(row, map.title),
        primary_person: field(row, map.speaker),
        location: field(row, map.congregation),
        presider: field(row, map.presider),
        reader: field(row, map.reader),
        hospitality_note: map.hospitality.map(|i| field(row, i)).unwrap_or_default(),
    })
}

/// Normalize a batch, dropping rows whose date cannot be parsed.
pub fn normalize_rows<I>(rows: I, format: SourceFormat) -> Vec<CanonicalRecord>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut dropped = 0usize;
    let records: Vec<CanonicalRecord> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let rec = normalize(&row, format);
            if rec.is_none() {
                log::debug!(
                    "row {i}: unparseable date {:?}, skipped",
                    row.first().map(String::as_str).unwrap_or("")
                );
                dropped += 1;
            }
            rec
        })
        .collect();
    if dropped > 0 {
        log::warn!("{dropped} row(s) skipped: date not in {format:?} format");
    }
    records
}

/// Read every row of `path` in the given format and normalize it.
pub fn load(path: &Path, format: SourceFormat, sheet: &SheetOptions) -> Result<Vec<CanonicalRecord>, Error> {
    let rows = match format {
        SourceFormat::FlatFile => flat_file::read_file(path)?,
        SourceFormat::Spreadsheet => xlsx::read_sheet(path, sheet.name.as_deref(), sheet.skip_rows)?,
    };
    log::info!("read {} row(s) from {}", rows.len(), path.display());
    Ok(normalize_rows(rows, format))
}

/// Which worksheet of a workbook to read and how many leading rows to skip.
#[derive(Clone, Debug)]
pub struct SheetOptions {
    pub name: Option<String>,
    pub skip_rows: usize,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            name: Some("Dados - Discursos".to_string()),
            skip_rows: 13,
        }
    }
}
