//! Schedule table layout: turns canonical records into an ordered list of
//! bands (title, month headers, rows) with every row height resolved.

pub mod classify;
pub mod filter;
pub mod group;
pub mod height;

use chrono::Datelike;

use crate::error::Error;
use crate::model::{CanonicalRecord, DateRange, Layout, LayoutInstruction};
use crate::schema::ColumnSchema;

use classify::classify;
use filter::filter_and_sort;
use group::{MonthGroup, group_by_month};
use height::{TextMeasure, resolve_row_height};

/// Report title with the year of the first day in range appended.
pub fn report_title(prefix: &str, range: &DateRange) -> String {
    format!("{} {}", prefix.trim_end(), range.start.year())
}

/// Emit one month header and its rows. `counter` is the band counter before
/// the header; the returned value is the counter after the last row.
fn emit_group<M: TextMeasure + ?Sized>(
    group: &MonthGroup,
    counter: usize,
    schema: &ColumnSchema,
    measure: &M,
    out: &mut Vec<LayoutInstruction>,
) -> Result<usize, Error> {
    out.push(LayoutInstruction::MonthHeaderBand { label: group.label });
    let counter = counter + 1;

    group.records.iter().try_fold(counter, |counter, record| {
        let height = resolve_row_height(record, schema, measure)?;
        let style = classify(&record.title, counter);
        log::debug!(
            "LAYOUT row band={} date={} h={:.2} style={:?}",
            counter,
            record.event_date,
            height,
            style
        );
        out.push(LayoutInstruction::RowBand {
            record: record.clone(),
            cells: schema.cell_texts(record),
            height,
            style,
        });
        Ok(counter + 1)
    })
}

/// Build the full instruction stream for one document.
///
/// Records are sorted and restricted to `range`, grouped by month, and laid
/// out under `schema`. Row fill parity follows a counter advanced by every
/// header and row band (the title band does not count), so a month header
/// flips the parity of the rows after it.
pub fn render<M: TextMeasure + ?Sized>(
    records: Vec<CanonicalRecord>,
    range: &DateRange,
    schema: &ColumnSchema,
    title: &str,
    measure: &M,
) -> Result<Layout, Error> {
    let input_len = records.len();
    let records = filter_and_sort(records, range);

    let mut instructions = Vec::with_capacity(records.len() * 2 + 1);
    instructions.push(LayoutInstruction::TitleBand {
        text: title.to_string(),
    });

    let mut groups = 0usize;
    let bands = group_by_month(&records).try_fold(0usize, |counter, group| {
        groups += 1;
        emit_group(&group, counter, schema, measure, &mut instructions)
    })?;

    log::info!(
        "layout: {} of {} record(s) in {}..={}, {} month group(s), {} band(s)",
        records.len(),
        input_len,
        range.start,
        range.end,
        groups,
        bands + 1
    );

    Ok(Layout {
        schema: schema.clone(),
        instructions,
    })
}
