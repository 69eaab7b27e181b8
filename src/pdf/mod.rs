//! PDF document surface: text measurement for the layout engine and the
//! renderer that replays a [`Layout`] onto A4 pages.

mod painter;
mod text;

use std::collections::BTreeSet;

use pdf_writer::{Filter, Name, Pdf, Rect, Ref};

use crate::config::RenderOptions;
use crate::error::Error;
use crate::fonts::LoadedFont;
use crate::layout::height::TextMeasure;
use crate::model::{Alignment, Layout, LayoutInstruction, StyleClass};
use crate::schema::ColumnId;

use painter::{FontSlot, Painter, SurfaceFonts};
use text::wrap_lines;

pub struct PdfSurface {
    opts: RenderOptions,
    fonts: SurfaceFonts,
}

impl PdfSurface {
    /// Load the configured fonts. Helvetica is used for any slot without a
    /// font file.
    pub fn new(opts: RenderOptions) -> Result<Self, Error> {
        let load = |path: &Option<std::path::PathBuf>, bold: bool| match path {
            Some(p) => LoadedFont::from_file(p),
            None => Ok(LoadedFont::helvetica(bold)),
        };
        let fonts = SurfaceFonts {
            regular: load(&opts.font, false)?,
            bold: load(&opts.bold_font, true)?,
        };
        Ok(Self { opts, fonts })
    }

    /// Serialize `layout` into a complete PDF.
    pub fn finish(&self, layout: &Layout) -> Result<Vec<u8>, Error> {
        let t0 = std::time::Instant::now();
        let opts = &self.opts;
        let schema = &layout.schema;

        let table_w = schema.total_width();
        let avail_w = opts.page_width - 2.0 * opts.margin_left;
        if table_w > avail_w + 0.5 {
            log::warn!("table is {table_w:.1}pt wide but only {avail_w:.1}pt fit between the margins");
        }

        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let catalog_id = alloc();
        let pages_id = alloc();

        // Phase 1: characters per face, then embed the faces
        let mut regular_chars: BTreeSet<char> = BTreeSet::from([' ']);
        let mut bold_chars: BTreeSet<char> = BTreeSet::from([' ']);
        bold_chars.extend(schema.columns().iter().flat_map(|c| c.header.chars()));
        for ins in &layout.instructions {
            match ins {
                LayoutInstruction::TitleBand { text } => bold_chars.extend(text.chars()),
                LayoutInstruction::MonthHeaderBand { label } => bold_chars.extend(label.chars()),
                LayoutInstruction::RowBand { cells, .. } => {
                    regular_chars.extend(cells.iter().flat_map(|c| c.chars()))
                }
            }
        }
        let entries = [
            self.fonts.regular.register(&mut pdf, "F1".to_string(), &mut alloc, &regular_chars)?,
            self.fonts.bold.register(&mut pdf, "F2".to_string(), &mut alloc, &bold_chars)?,
        ];
        let t_fonts = t0.elapsed();

        // Phase 2: paint bands
        let mut painter = Painter::new(opts, &self.fonts, &entries);
        let left = opts.margin_left;
        let palette = &opts.palette;

        for (i, ins) in layout.instructions.iter().enumerate() {
            match ins {
                LayoutInstruction::TitleBand { text } => {
                    if !painter.fits(opts.title_height) {
                        painter.new_page();
                    }
                    painter.set_font(FontSlot::Bold, opts.title_font_size);
                    painter.set_fill_color(palette.title_fill);
                    painter.set_text_color(palette.title_text);
                    painter.draw_cell(left, table_w, opts.title_height, text, Alignment::Center);
                    painter.ln(opts.title_height);
                }
                LayoutInstruction::MonthHeaderBand { label } => {
                    // Keep a month header on the same page as its first row.
                    let next_row_h = match layout.instructions.get(i + 1) {
                        Some(LayoutInstruction::RowBand { height, .. }) => *height,
                        _ => 0.0,
                    };
                    if !painter.fits(opts.header_height + next_row_h) {
                        painter.new_page();
                    }
                    painter.set_font(FontSlot::Bold, opts.header_font_size);
                    painter.set_fill_color(palette.header_fill);
                    painter.set_text_color(palette.header_text);
                    let mut x = left;
                    for col in schema.columns() {
                        let text = if col.id == ColumnId::Date { *label } else { col.header };
                        painter.draw_cell(x, col.width, opts.header_height, text, col.alignment);
                        x += col.width;
                    }
                    painter.ln(opts.header_height);
                }
                LayoutInstruction::RowBand { cells, height, style, record } => {
                    if !painter.fits(*height) {
                        log::debug!("page break before row dated {}", record.event_date);
                        painter.new_page();
                    }
                    log::debug!(
                        "TABLE row date={} h={:.2} style={:?} page={}",
                        record.event_date,
                        height,
                        style,
                        painter.page_count()
                    );
                    painter.set_font(FontSlot::Regular, opts.row_font_size);
                    painter.set_text_color(palette.row_text);
                    painter.set_fill_color(match style {
                        StyleClass::Special => palette.special_fill,
                        StyleClass::OrdinaryEven => palette.even_fill,
                        StyleClass::OrdinaryOdd => palette.odd_fill,
                    });
                    let mut x = left;
                    for (col, text) in schema.columns().iter().zip(cells) {
                        painter.draw_wrapped_cell(x, col.width, *height, text, col.alignment);
                        x += col.width;
                    }
                    painter.ln(*height);
                }
            }
        }
        let all_contents = painter.finish();
        let t_layout = t0.elapsed();

        // Phase 3: page objects
        let n = all_contents.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        for (i, c) in all_contents.into_iter().enumerate() {
            let raw = c.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, opts.page_width, opts.page_height))
                .parent(pages_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            for entry in &entries {
                fonts.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
            }
        }

        let t_assembly = t0.elapsed();
        log::info!(
            "Render phases: font_embed={:.1}ms, paint={:.1}ms, assembly={:.1}ms ({} page(s))",
            t_fonts.as_secs_f64() * 1000.0,
            (t_layout - t_fonts).as_secs_f64() * 1000.0,
            (t_assembly - t_layout).as_secs_f64() * 1000.0,
            n,
        );

        Ok(pdf.finish())
    }
}

impl TextMeasure for PdfSurface {
    /// Wrapped height of `text` set in the row font inside a cell `width`
    /// points wide, padding included. Empty text measures as one line.
    fn measure_wrapped_height(&self, text: &str, width: f32) -> Result<f32, Error> {
        let opts = &self.opts;
        if !width.is_finite() {
            return Err(Error::measure(text, width, "width is not finite"));
        }
        let text_w = width - 2.0 * opts.cell_padding_x;
        if text_w <= 0.0 {
            return Err(Error::measure(text, width, "cell is narrower than its padding"));
        }
        let lines = wrap_lines(&self.fonts.regular, text, opts.row_font_size, text_w);
        Ok(lines.len().max(1) as f32 * opts.row_font_size * opts.line_height_ratio + 2.0 * opts.cell_padding_y)
    }
}
