use crate::fonts::LoadedFont;

/// One wrapped line and its advance width at the size it was wrapped for.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct TextLine {
    pub(super) text: String,
    pub(super) width: f32,
}

/// Greedy word wrap into lines no wider than `max_width`.
///
/// Explicit newlines always break. Leading spaces of a line are kept (they
/// indent the attribution line of the talk cell); runs of inner whitespace
/// collapse to one space. A word wider than a whole line is split between
/// characters. Empty input gives one empty line.
pub(super) fn wrap_lines(font: &LoadedFont, text: &str, font_size: f32, max_width: f32) -> Vec<TextLine> {
    let space_w = font.text_width(" ", font_size);
    let mut lines = Vec::new();

    for para in text.split('\n') {
        let body = para.trim_start_matches(' ');
        let indent = &para[..para.len() - body.len()];

        let mut current = TextLine {
            text: indent.to_string(),
            width: font.text_width(indent, font_size),
        };
        let mut has_word = false;

        for word in body.split_whitespace() {
            let ww = font.text_width(word, font_size);

            if has_word && current.width + space_w + ww > max_width {
                lines.push(std::mem::replace(&mut current, TextLine { text: String::new(), width: 0.0 }));
                has_word = false;
            }
            if has_word {
                current.text.push(' ');
                current.width += space_w;
            }

            if current.width + ww <= max_width {
                current.text.push_str(word);
                current.width += ww;
            } else {
                for ch in word.chars() {
                    let cw = font.char_width_1000(ch) * font_size / 1000.0;
                    if !current.text.is_empty() && current.width + cw > max_width {
                        lines.push(std::mem::replace(&mut current, TextLine { text: String::new(), width: 0.0 }));
                    }
                    current.text.push(ch);
                    current.width += cw;
                }
            }
            has_word = true;
        }
        lines.push(current);
    }
    lines
}
