use chrono::{Datelike, NaiveDate};

/// Brazilian Portuguese three-letter month abbreviations, January first.
const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

pub(crate) const SPREADSHEET_DATE: &str = "%d/%m/%Y";
pub(crate) const FLAT_FILE_DATE: &str = "%Y-%m-%d";

pub fn month_short(date: NaiveDate) -> &'static str {
    MONTHS_SHORT[date.month0() as usize]
}

/// Day of month without zero padding.
pub(crate) fn day_label(date: NaiveDate) -> String {
    date.day().to_string()
}

pub(crate) fn parse_date(text: &str, pattern: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), pattern).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_labels_are_portuguese() {
        let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
        assert_eq!(month_short(d(2)), "Fev");
        assert_eq!(month_short(d(8)), "Ago");
        assert_eq!(month_short(d(12)), "Dez");
    }

    #[test]
    fn parses_both_source_patterns() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_date("09/03/2024", SPREADSHEET_DATE), expected);
        assert_eq!(parse_date("9/3/2024", SPREADSHEET_DATE), expected);
        assert_eq!(parse_date(" 2024-03-09 ", FLAT_FILE_DATE), expected);
        assert_eq!(parse_date("2024-03-09", SPREADSHEET_DATE), None);
        assert_eq!(parse_date("", FLAT_FILE_DATE), None);
    }

    #[test]
    fn day_label_is_unpadded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(day_label(date), "9");
    }
}
