use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;

/// A font as used for measuring; turned into a PDF resource by [`LoadedFont::register`]
/// once the set of characters drawn with it is known.
pub(crate) struct LoadedFont {
    source: FontSource,
    /// Per-char advance in 1000-units, filled lazily for TrueType faces.
    advance_cache: RefCell<HashMap<char, f32>>,
}

enum FontSource {
    /// One of the standard 14 fonts, drawn with WinAnsi encoding.
    Builtin {
        base_font: &'static str,
        widths_1000: Vec<f32>,
    },
    TrueType {
        name: String,
        data: Mmap,
        face_index: u32,
        units: f32,
        ascender_ratio: f32,
    },
}

/// A font written into the PDF.
pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
}

impl FontEntry {
    /// Bytes for a `Tj` operand in this font's encoding.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

impl LoadedFont {
    pub(crate) fn helvetica(bold: bool) -> Self {
        Self {
            source: FontSource::Builtin {
                base_font: if bold { "Helvetica-Bold" } else { "Helvetica" },
                widths_1000: helvetica_widths(bold),
            },
            advance_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Memory-map a TrueType/OpenType file (first face of a collection).
    pub(crate) fn from_file(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        // SAFETY: the mapping is read-only and the file is not modified while
        // the document is being built.
        let data = unsafe { Mmap::map(&file)? };
        let face = Face::parse(&data, 0)
            .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;

        let units = face.units_per_em() as f32;
        let ascender_ratio = face.ascender() as f32 / units;
        let name = font_family_name(&face).unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Embedded")
                .to_string()
        });
        log::debug!("font: loaded {name} from {} ({} bytes)", path.display(), data.len());

        Ok(Self {
            source: FontSource::TrueType {
                name,
                data,
                face_index: 0,
                units,
                ascender_ratio,
            },
            advance_cache: RefCell::new(HashMap::new()),
        })
    }

    /// Width of a single character in 1000-units.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        match &self.source {
            FontSource::Builtin { widths_1000, .. } => {
                let byte = char_to_winansi(ch);
                if byte >= 32 {
                    widths_1000[(byte - 32) as usize]
                } else {
                    0.0
                }
            }
            FontSource::TrueType { data, face_index, units, .. } => {
                if let Some(&w) = self.advance_cache.borrow().get(&ch) {
                    return w;
                }
                let w = Face::parse(data, *face_index)
                    .ok()
                    .and_then(|face| face.glyph_index(ch).and_then(|gid| face.glyph_hor_advance(gid)))
                    .map(|adv| adv as f32 / units * 1000.0)
                    .unwrap_or(0.0);
                self.advance_cache.borrow_mut().insert(ch, w);
                w
            }
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    /// Baseline offset from the top of a line, as a fraction of the font size.
    pub(crate) fn ascender_ratio(&self) -> f32 {
        match &self.source {
            FontSource::Builtin { .. } => 0.75,
            FontSource::TrueType { ascender_ratio, .. } => *ascender_ratio,
        }
    }

    pub(crate) fn register(
        &self,
        pdf: &mut Pdf,
        pdf_name: String,
        alloc: &mut impl FnMut() -> Ref,
        used_chars: &BTreeSet<char>,
    ) -> Result<FontEntry, Error> {
        let t0 = std::time::Instant::now();
        let font_ref = alloc();
        let char_to_gid = match &self.source {
            FontSource::Builtin { base_font, .. } => {
                pdf.type1_font(font_ref)
                    .base_font(Name(base_font.as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                None
            }
            FontSource::TrueType { name, data, face_index, .. } => {
                // The measuring face is the drawn face; no Helvetica fallback.
                Some(embed_truetype(pdf, font_ref, name, data, *face_index, used_chars, alloc)?)
            }
        };
        log::debug!(
            "register_font: {pdf_name} ({} chars) → {:.1}ms",
            used_chars.len(),
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        Ok(FontEntry {
            pdf_name,
            font_ref,
            char_to_gid,
        })
    }
}

fn font_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F | 0x00A0..=0x00FF => c as u8,
        _ => WINANSI_HIGH
            .iter()
            .find(|&&(_, ch)| ch == c)
            .map_or(0, |&(byte, _)| byte),
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Unmappable characters are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| match char_to_winansi(c) {
            0 => None,
            b => Some(b),
        })
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.extend_from_slice(&gid.to_be_bytes());
    }
    out
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match (b, bold) {
            (32, _) => 278.0,                          // space
            (33..=47, _) => 333.0,                     // punctuation
            (48..=57, _) => 556.0,                     // digits
            (58..=64, _) => 333.0,                     // more punctuation
            (73, _) => 278.0,                          // I
            (74, false) => 500.0,                      // J
            (74, true) => 556.0,
            (77, _) => 833.0,                          // M (wide)
            (87, _) => 944.0,                          // W
            (65..=90, false) => 667.0,                 // uppercase A-Z (average)
            (65..=90, true) => 722.0,
            (91..=96, _) => 333.0,                     // brackets etc.
            (105 | 106 | 108, _) => 278.0,             // narrow lowercase: i j l
            (102 | 116, _) => 333.0,                   // f t
            (114, _) => 389.0,                         // r
            (109, false) => 833.0,                     // m
            (109, true) => 889.0,
            (119, _) => 778.0,                         // w
            (97..=122, false) => 556.0,                // lowercase a-z (average)
            (97..=122, true) => 611.0,
            (0x97, _) => 1000.0,                       // em dash
            (0x96, _) => 556.0,                        // en dash
            (0x93 | 0x94, false) => 333.0,             // curly quotes
            (0x93 | 0x94, true) => 500.0,
            (0xC0..=0xDF, false) => 667.0,             // accented uppercase
            (0xC0..=0xDF, true) => 722.0,
            (0xE0..=0xFF, false) => 556.0,             // accented lowercase
            (0xE0..=0xFF, true) => 611.0,
            _ => 556.0,
        })
        .collect()
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to the glyphs of `used_chars`. Returns the
/// char → subset glyph id map content streams must encode with.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<HashMap<char, u16>, Error> {
    let face = Face::parse(font_data, face_index)
        .map_err(|e| Error::Font(format!("{font_name} cannot be embedded: {e}")))?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;
    let cap_height = face.capital_height().map(|h| to_1000(h as f32)).unwrap_or(700.0);
    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min as f32),
        to_1000(bb.y_min as f32),
        to_1000(bb.x_max as f32),
        to_1000(bb.y_max as f32),
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            if char_to_gid.insert(ch, new_gid).is_none() {
                let w = face.glyph_hor_advance(gid).map(|adv| to_1000(adv as f32)).unwrap_or(0.0);
                gid_widths.push((new_gid, w));
            }
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}, embedding full font");
        font_data.to_vec()
    });
    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::Font(format!("{font_name} is too large to embed")))?;
    pdf.stream(data_ref, &subset_data).pair(Name(b"Length1"), data_len);

    let ps_name: String = font_name.chars().filter(|c| !c.is_whitespace()).collect();

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender() as f32))
        .descent(to_1000(face.descender() as f32))
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let identity = || pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };

    let cid_font_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(identity());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity());
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(char_to_gid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winansi_keeps_portuguese_and_em_dash() {
        assert_eq!(to_winansi_bytes("Ação — ok"), vec![b'A', 0xE7, 0xE3, b'o', b' ', 0x97, b' ', b'o', b'k']);
        assert_eq!(to_winansi_bytes("a\u{4E2D}b"), b"ab");
    }

    #[test]
    fn gids_are_big_endian_pairs() {
        let map = HashMap::from([('A', 0x0102u16), ('B', 3)]);
        assert_eq!(encode_as_gids("AB?", &map), vec![0x01, 0x02, 0x00, 0x03, 0x00, 0x00]);
    }

    #[test]
    fn builtin_widths_scale_with_size() {
        let font = LoadedFont::helvetica(false);
        assert!((font.text_width("0", 10.0) - 5.56).abs() < 1e-4);
        assert!((font.text_width("00", 20.0) - 22.24).abs() < 1e-4);
        assert_eq!(font.text_width("", 11.0), 0.0);
        let bold = LoadedFont::helvetica(true);
        assert!(bold.text_width("Leitor", 11.0) > font.text_width("Leitor", 11.0));
    }

    #[test]
    fn unembeddable_face_fails_instead_of_falling_back() {
        let mut file = tempfile::tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"not a font").unwrap();
        let data = unsafe { Mmap::map(&file).unwrap() };
        let font = LoadedFont {
            source: FontSource::TrueType {
                name: "Broken".into(),
                data,
                face_index: 0,
                units: 1000.0,
                ascender_ratio: 0.8,
            },
            advance_cache: RefCell::new(HashMap::new()),
        };

        let mut pdf = Pdf::new();
        let mut next = 1;
        let mut alloc = || {
            next += 1;
            Ref::new(next)
        };
        let result = font.register(&mut pdf, "F1".into(), &mut alloc, &BTreeSet::from(['a']));
        assert!(matches!(result, Err(Error::Font(ref msg)) if msg.contains("Broken")));
    }

    #[test]
    fn missing_font_file_is_an_io_error() {
        let err = LoadedFont::from_file(Path::new("/nonexistent/font.ttf")).err().unwrap();
        assert!(matches!(err, Error::Io(_)));
    }
}
