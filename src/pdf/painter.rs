use pdf_writer::{Content, Name, Str};

use crate::config::RenderOptions;
use crate::fonts::{FontEntry, LoadedFont};
use crate::model::Alignment;

use super::text::{TextLine, wrap_lines};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FontSlot {
    Regular,
    Bold,
}

/// The two faces a schedule is drawn with.
pub(crate) struct SurfaceFonts {
    pub(crate) regular: LoadedFont,
    pub(crate) bold: LoadedFont,
}

impl SurfaceFonts {
    pub(crate) fn get(&self, slot: FontSlot) -> &LoadedFont {
        match slot {
            FontSlot::Regular => &self.regular,
            FontSlot::Bold => &self.bold,
        }
    }
}

fn rgb(c: [u8; 3]) -> (f32, f32, f32) {
    (c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0)
}

/// Draws bands top to bottom, opening pages as it goes. Positions passed in
/// are measured from the left page edge and the top of the current band.
pub(super) struct Painter<'a> {
    opts: &'a RenderOptions,
    fonts: &'a SurfaceFonts,
    entries: &'a [FontEntry; 2],
    pages: Vec<Content>,
    content: Content,
    /// Distance from the top page edge to the top of the next band.
    cursor: f32,
    fill: [u8; 3],
    text_color: [u8; 3],
    font: FontSlot,
    font_size: f32,
}

impl<'a> Painter<'a> {
    pub(super) fn new(opts: &'a RenderOptions, fonts: &'a SurfaceFonts, entries: &'a [FontEntry; 2]) -> Self {
        Self {
            opts,
            fonts,
            entries,
            pages: Vec::new(),
            content: Content::new(),
            cursor: opts.margin_top,
            fill: [255, 255, 255],
            text_color: [0, 0, 0],
            font: FontSlot::Regular,
            font_size: opts.row_font_size,
        }
    }

    fn at_page_top(&self) -> bool {
        (self.cursor - self.opts.margin_top).abs() < 0.01
    }

    /// Whether a band of `height` fits above the bottom margin. Always true at
    /// the top of a page, so an oversized band is drawn rather than looping.
    pub(super) fn fits(&self, height: f32) -> bool {
        self.at_page_top() || self.cursor + height <= self.opts.page_height - self.opts.margin_bottom
    }

    pub(super) fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    pub(super) fn new_page(&mut self) {
        self.pages.push(std::mem::replace(&mut self.content, Content::new()));
        self.cursor = self.opts.margin_top;
    }

    pub(super) fn set_fill_color(&mut self, color: [u8; 3]) {
        self.fill = color;
    }

    pub(super) fn set_text_color(&mut self, color: [u8; 3]) {
        self.text_color = color;
    }

    pub(super) fn set_font(&mut self, slot: FontSlot, size: f32) {
        self.font = slot;
        self.font_size = size;
    }

    /// Advance to the next band.
    pub(super) fn ln(&mut self, height: f32) {
        self.cursor += height;
    }

    fn entry(&self) -> &FontEntry {
        match self.font {
            FontSlot::Regular => &self.entries[0],
            FontSlot::Bold => &self.entries[1],
        }
    }

    fn y(&self, from_top: f32) -> f32 {
        self.opts.page_height - from_top
    }

    fn fill_and_border(&mut self, x: f32, w: f32, h: f32) {
        let bottom = self.y(self.cursor + h);
        let (r, g, b) = rgb(self.fill);
        let (br, bg, bb) = rgb(self.opts.palette.border);
        self.content.save_state();
        self.content.set_fill_rgb(r, g, b);
        self.content.set_stroke_rgb(br, bg, bb);
        self.content.set_line_width(self.opts.border_width);
        self.content.rect(x, bottom, w, h);
        self.content.fill_nonzero_and_stroke();
        self.content.restore_state();
    }

    fn line_x(&self, x: f32, w: f32, line_w: f32, align: Alignment) -> f32 {
        let pad = self.opts.cell_padding_x;
        match align {
            Alignment::Left => x + pad,
            Alignment::Center => x + (w - line_w) / 2.0,
        }
    }

    fn show_lines(&mut self, lines: &[TextLine], x: f32, w: f32, first_baseline: f32, align: Alignment) {
        if lines.iter().all(|l| l.text.is_empty()) {
            return;
        }
        let line_h = self.font_size * self.opts.line_height_ratio;
        let (r, g, b) = rgb(self.text_color);
        let font_name = self.entry().pdf_name.clone();

        self.content.begin_text();
        self.content.set_fill_rgb(r, g, b);
        self.content.set_font(Name(font_name.as_bytes()), self.font_size);
        let (mut td_x, mut td_y) = (0.0f32, 0.0f32);
        for (i, line) in lines.iter().enumerate() {
            if line.text.is_empty() {
                continue;
            }
            let lx = self.line_x(x, w, line.width, align);
            let ly = first_baseline - i as f32 * line_h;
            self.content.next_line(lx - td_x, ly - td_y);
            td_x = lx;
            td_y = ly;
            let bytes = self.entry().encode(&line.text);
            self.content.show(Str(&bytes));
        }
        self.content.end_text();
    }

    /// Filled, bordered single-line cell with the text centred vertically.
    pub(super) fn draw_cell(&mut self, x: f32, w: f32, h: f32, text: &str, align: Alignment) {
        self.fill_and_border(x, w, h);
        let fonts = self.fonts;
        let font = fonts.get(self.font);
        let line = TextLine {
            text: text.to_string(),
            width: font.text_width(text, self.font_size),
        };
        let baseline = self.cursor + (h - self.font_size) / 2.0 + self.font_size * font.ascender_ratio();
        self.show_lines(&[line], x, w, self.y(baseline), align);
    }

    /// Filled, bordered cell with text wrapped to the cell width, top aligned.
    pub(super) fn draw_wrapped_cell(&mut self, x: f32, w: f32, h: f32, text: &str, align: Alignment) {
        self.fill_and_border(x, w, h);
        let fonts = self.fonts;
        let font = fonts.get(self.font);
        let text_w = (w - 2.0 * self.opts.cell_padding_x).max(0.0);
        let lines = wrap_lines(font, text, self.font_size, text_w);
        let line_h = self.font_size * self.opts.line_height_ratio;
        let baseline = self.cursor
            + self.opts.cell_padding_y
            + (line_h - self.font_size) / 2.0
            + self.font_size * font.ascender_ratio();
        self.show_lines(&lines, x, w, self.y(baseline), align);
    }

    pub(super) fn finish(mut self) -> Vec<Content> {
        self.pages.push(self.content);
        self.pages
    }
}
