//! Built-in 5x7 bitmap font for the win/lose overlay.
//!
//! Each glyph is seven rows, top row first; bit 4 of a row is the leftmost
//! column. Text is laid out as a list of filled square cells which the game
//! turns into quads, so no font texture or glyph atlas is needed.

pub const GLYPH_COLUMNS: usize = 5;
pub const GLYPH_ROWS: usize = 7;
/// Horizontal cells consumed per character, including one column of spacing.
pub const GLYPH_ADVANCE: usize = GLYPH_COLUMNS + 1;

pub type Glyph = [u8; GLYPH_ROWS];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub center_x: f32,
    pub center_y: f32,
    pub size: f32,
}

pub fn glyph(c: char) -> Option<Glyph> {
    let rows = match c.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        ' ' => [0; GLYPH_ROWS],
        _ => return None,
    };
    Some(rows)
}

/// Width of `text` in cells. Trailing spacing after the last glyph is not counted.
pub fn text_width_cells(text: &str) -> usize {
    let count = text.chars().count();
    if count == 0 {
        0
    } else {
        count * GLYPH_ADVANCE - 1
    }
}

/// Lay out `text` centred on `(center_x, center_y)`. Characters with no glyph
/// still advance the pen, so they render as a blank.
pub fn layout_text(text: &str, center_x: f32, center_y: f32, cell_size: f32) -> Vec<CellRect> {
    let width = text_width_cells(text) as f32 * cell_size;
    let left = center_x - width * 0.5;
    let top = center_y + GLYPH_ROWS as f32 * cell_size * 0.5;

    let mut cells = Vec::new();
    for (index, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else {
            continue;
        };
        let pen = index * GLYPH_ADVANCE;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_COLUMNS {
                if bits & (1 << (GLYPH_COLUMNS - 1 - col)) == 0 {
                    continue;
                }
                cells.push(CellRect {
                    center_x: left + ((pen + col) as f32 + 0.5) * cell_size,
                    center_y: top - (row as f32 + 0.5) * cell_size,
                    size: cell_size,
                });
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_messages_have_glyphs() {
        for c in "YOU WIN! YOU LOSE PRESS R".chars() {
            assert!(glyph(c).is_some(), "missing glyph for {c:?}");
        }
    }

    #[test]
    fn lowercase_maps_to_uppercase() {
        assert_eq!(glyph('w'), glyph('W'));
    }

    #[test]
    fn width_counts_spacing_between_glyphs_only() {
        assert_eq!(text_width_cells(""), 0);
        assert_eq!(text_width_cells("A"), 5);
        assert_eq!(text_width_cells("AB"), 11);
    }

    #[test]
    fn single_glyph_lights_expected_cells() {
        let cells = layout_text("I", 0.0, 0.0, 1.0);
        assert_eq!(cells.len(), 11);
    }

    #[test]
    fn layout_is_centred_and_bounded() {
        let cell = 0.25;
        let cells = layout_text("YOU WIN", 10.0, 5.0, cell);
        let half_w = text_width_cells("YOU WIN") as f32 * cell * 0.5;
        let half_h = GLYPH_ROWS as f32 * cell * 0.5;
        assert!(!cells.is_empty());
        for c in &cells {
            assert!(c.center_x > 10.0 - half_w && c.center_x < 10.0 + half_w);
            assert!(c.center_y > 5.0 - half_h && c.center_y < 5.0 + half_h);
        }
    }

    #[test]
    fn unknown_characters_render_blank_but_advance() {
        let plain = layout_text("AA", 0.0, 0.0, 1.0);
        let gap = layout_text("A~A", 0.0, 0.0, 1.0);
        assert_eq!(plain.len(), gap.len());
        let plain_span = plain.last().unwrap().center_x - plain[0].center_x;
        let gap_span = gap.last().unwrap().center_x - gap[0].center_x;
        assert!((gap_span - plain_span - GLYPH_ADVANCE as f32).abs() < 1e-5);
    }
}
