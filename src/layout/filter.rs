use crate::model::{CanonicalRecord, DateRange};

/// Stable ascending sort by date, then keep the records inside `range`.
/// Records sharing a date keep their input order.
pub fn filter_and_sort(mut records: Vec<CanonicalRecord>, range: &DateRange) -> Vec<CanonicalRecord> {
    records.sort_by_key(|r| r.event_date);
    records.retain(|r| range.contains(r.event_date));
    records
}
