use std::path::PathBuf;

use chrono::NaiveDate;

use crate::model::DateRange;
use crate::schema::{ColumnSchema, MM};

pub const DEFAULT_TITLE_PREFIX: &str = "Discursos Públicos — Congregação Esperança";
pub const DEFAULT_MONTHS_AHEAD: u32 = 3;

/// RGB fill and text colours of every band kind.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub title_fill: [u8; 3],
    pub title_text: [u8; 3],
    pub header_fill: [u8; 3],
    pub header_text: [u8; 3],
    pub row_text: [u8; 3],
    pub even_fill: [u8; 3],
    pub odd_fill: [u8; 3],
    pub special_fill: [u8; 3],
    pub border: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            title_fill: [33, 65, 81],
            title_text: [255, 255, 255],
            header_fill: [63, 120, 143],
            header_text: [255, 255, 255],
            row_text: [0, 0, 0],
            even_fill: [255, 255, 255],
            odd_fill: [239, 239, 239],
            special_fill: [216, 208, 160],
            border: [0, 0, 0],
        }
    }
}

/// Page geometry, type sizes and fonts of the PDF surface. All lengths in points.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub title_height: f32,
    pub header_height: f32,
    pub title_font_size: f32,
    pub header_font_size: f32,
    pub row_font_size: f32,
    /// Line pitch as a multiple of the font size.
    pub line_height_ratio: f32,
    pub cell_padding_x: f32,
    pub cell_padding_y: f32,
    pub border_width: f32,
    pub palette: Palette,
    /// TrueType font for row text; Helvetica when unset.
    pub font: Option<PathBuf>,
    /// TrueType font for the title and headers; Helvetica-Bold when unset.
    pub bold_font: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_width: 210.0 * MM,
            page_height: 297.0 * MM,
            margin_left: 2.0 * MM,
            margin_top: 2.0 * MM,
            margin_bottom: 2.0 * MM,
            title_height: 10.0 * MM,
            header_height: 8.0 * MM,
            title_font_size: 20.0,
            header_font_size: 14.0,
            row_font_size: 11.0,
            line_height_ratio: 1.25,
            cell_padding_x: 1.0 * MM,
            cell_padding_y: 0.0,
            border_width: 0.2 * MM,
            palette: Palette::default(),
            font: None,
            bold_font: None,
        }
    }
}

/// Everything one document build needs besides the records themselves.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub range: DateRange,
    pub schema: ColumnSchema,
    /// Title text; the year of the range start is appended.
    pub title_prefix: String,
    pub render: RenderOptions,
}

impl ReportConfig {
    /// Default report for `today`: the current month and the next three.
    pub fn for_date(today: NaiveDate) -> Self {
        Self {
            range: DateRange::months_ahead(today, DEFAULT_MONTHS_AHEAD),
            schema: ColumnSchema::hospitality(),
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            render: RenderOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_is_a4_with_schema_fitting_between_margins() {
        let opts = RenderOptions::default();
        assert!((opts.page_width - 595.28).abs() < 0.01);
        assert!((opts.page_height - 841.89).abs() < 0.01);
        let inner = opts.page_width - 2.0 * opts.margin_left;
        assert!((ColumnSchema::hospitality().total_width() - inner).abs() < 0.01);
    }

    #[test]
    fn report_for_date_covers_four_months() {
        let cfg = ReportConfig::for_date(NaiveDate::from_ymd_opt(2024, 3, 17).unwrap());
        assert_eq!(cfg.range.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(cfg.range.end, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }
}
