//! Text fitting utilities
//!
//! Every renderer sizes and clips text through these helpers so label density
//! stays consistent across label stocks:
//! - Step-table font size by string length
//! - Hard truncation to a character count
//! - Greedy line wrapping to an estimated text width

/// Length thresholds (exclusive) and the font size used above them, largest first
const FONT_STEPS: [(usize, f32); 5] = [(32, 3.5), (28, 4.0), (24, 4.5), (20, 5.5), (16, 6.5)];

/// Font size for strings of 16 characters or fewer
pub const BASE_FONT_SIZE: f32 = 8.0;

/// Average glyph advance of the built-in sans faces, as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Font size for a string, stepping down as it gets longer
///
/// | length | size |
/// |--------|------|
/// | > 32 | 3.5 |
/// | > 28 | 4 |
/// | > 24 | 4.5 |
/// | > 20 | 5.5 |
/// | > 16 | 6.5 |
/// | else | 8 |
pub fn font_size_for(text: &str) -> f32 {
    let len = text.chars().count();
    FONT_STEPS
        .iter()
        .find(|(threshold, _)| len > *threshold)
        .map(|(_, size)| *size)
        .unwrap_or(BASE_FONT_SIZE)
}

/// First `max_len` characters, verbatim
///
/// No ellipsis and no word-boundary handling.
pub fn truncate(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Estimated rendered width in points
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVG_GLYPH_WIDTH
}

/// How many characters fit on one line of `width` points
pub fn chars_per_line(width: f32, font_size: f32) -> usize {
    if font_size <= 0.0 || width <= 0.0 {
        return 1;
    }
    ((width / (font_size * AVG_GLYPH_WIDTH)).floor() as usize).max(1)
}

/// Wrap text into lines of at most `max_chars` characters
///
/// Explicit newlines are kept. Words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            let mut word_len = word.chars().count();

            // Hard-split words that can never fit
            while word_len > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                lines.push(truncate(&word, max_chars));
                word = word.chars().skip(max_chars).collect();
                word_len -= max_chars;
            }
            if word_len == 0 {
                continue;
            }

            let needed = if current_len == 0 { word_len } else { current_len + 1 + word_len };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&word);
            current_len += word_len;
        }

        lines.push(current);
    }

    lines
}
