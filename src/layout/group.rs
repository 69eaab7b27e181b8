use crate::dates::month_short;
use crate::model::CanonicalRecord;

/// A maximal run of consecutive records sharing a month label.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup<'a> {
    pub label: &'static str,
    pub records: &'a [CanonicalRecord],
}

/// Lazily splits a date-ordered slice where the month label changes from one
/// record to the next. Only neighbours are compared, so a month that shows up
/// again after another one starts a new group.
pub struct MonthGroups<'a> {
    rest: &'a [CanonicalRecord],
}

pub fn group_by_month(records: &[CanonicalRecord]) -> MonthGroups<'_> {
    MonthGroups { rest: records }
}

impl<'a> Iterator for MonthGroups<'a> {
    type Item = MonthGroup<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.first()?;
        let label = month_short(first.event_date);
        let len = self
            .rest
            .iter()
            .position(|r| month_short(r.event_date) != label)
            .unwrap_or(self.rest.len());
        let (records, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(MonthGroup { label, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(m: u32, d: u32) -> CanonicalRecord {
        CanonicalRecord::new(NaiveDate::from_ymd_opt(2024, m, d).unwrap(), "")
    }

    fn shape(records: &[CanonicalRecord]) -> Vec<(&'static str, usize)> {
        group_by_month(records).map(|g| (g.label, g.records.len())).collect()
    }

    #[test]
    fn contiguous_months_form_one_group_each() {
        let recs = [rec(3, 3), rec(3, 10), rec(4, 7), rec(5, 5), rec(5, 12)];
        assert_eq!(shape(&recs), [("Mar", 2), ("Abr", 1), ("Mai", 2)]);
    }

    #[test]
    fn repeated_month_after_interruption_is_a_new_group() {
        let recs = [rec(3, 3), rec(4, 7), rec(3, 24)];
        assert_eq!(shape(&recs), [("Mar", 1), ("Abr", 1), ("Mar", 1)]);
    }

    #[test]
    fn same_month_of_different_years_is_merged() {
        let recs = [
            CanonicalRecord::new(NaiveDate::from_ymd_opt(2024, 12, 29).unwrap(), ""),
            CanonicalRecord::new(NaiveDate::from_ymd_opt(2025, 12, 7).unwrap(), ""),
        ];
        assert_eq!(shape(&recs), [("Dez", 2)]);
    }

    #[test]
    fn group_count_matches_label_runs() {
        let recs = [rec(1, 7), rec(1, 14), rec(2, 4), rec(2, 11), rec(2, 25), rec(3, 3), rec(6, 2)];
        let labels: Vec<&str> = recs.iter().map(|r| month_short(r.event_date)).collect();
        let runs = 1 + labels.windows(2).filter(|w| w[0] != w[1]).count();
        assert_eq!(group_by_month(&recs).count(), runs);
        let total: usize = group_by_month(&recs).map(|g| g.records.len()).sum();
        assert_eq!(total, recs.len());
    }

    #[test]
    fn empty_input_has_no_groups() {
        assert_eq!(group_by_month(&[]).next(), None);
    }
}
