// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font resolution — two-tier strategy for replacement text rendering.
//
// Tier one loads a TrueType face from the configured paths (drawn with
// `imageproc`/`ab_glyph`). Tier two is a built-in scalable 5×7 bitmap
// face that can never fail to load, so composing is resilient to
// whatever fonts the host machine happens to have. Resolution returns a
// concrete handle; nothing throws past the composition boundary.

use std::path::PathBuf;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, info, warn};

/// A concrete font handle: either a loaded TrueType face or the
/// built-in bitmap fallback.
pub enum PageFont {
    Vector(FontVec),
    Bitmap(BitmapFont),
}

impl PageFont {
    /// Resolve a font from the preferred paths, falling back to the
    /// built-in bitmap face. Never fails.
    pub fn resolve(paths: &[PathBuf]) -> Self {
        for path in paths {
            match std::fs::read(path) {
                Ok(bytes) => match FontVec::try_from_vec(bytes) {
                    Ok(font) => {
                        info!(path = %path.display(), "TrueType font loaded");
                        return Self::Vector(font);
                    }
                    Err(err) => {
                        warn!(path = %path.display(), %err, "Font file unusable");
                    }
                },
                Err(err) => {
                    debug!(path = %path.display(), %err, "Font path not readable");
                }
            }
        }
        info!("No TrueType font available — using built-in bitmap face");
        Self::Bitmap(BitmapFont)
    }

    /// Measure the rendered extent of `text` at the given pixel size.
    pub fn measure(&self, text: &str, size_px: f32) -> (u32, u32) {
        match self {
            Self::Vector(font) => text_size(PxScale::from(size_px), font, text),
            Self::Bitmap(font) => font.measure(text, size_px),
        }
    }

    /// Draw `text` onto the canvas with its top-left corner at (x, y).
    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        color: Rgb<u8>,
        x: i32,
        y: i32,
        size_px: f32,
        text: &str,
    ) {
        match self {
            Self::Vector(font) => {
                draw_text_mut(canvas, color, x, y, PxScale::from(size_px), font, text);
            }
            Self::Bitmap(font) => font.draw(canvas, color, x, y, size_px, text),
        }
    }
}

/// Built-in scalable 5×7 bitmap face.
///
/// Glyph cells are 5×7 with a one-column advance gap; the requested
/// pixel size maps to the cell height. Lowercase letters reuse the
/// uppercase shapes — this face exists to keep composition working on
/// bare machines, not to win typography prizes.
pub struct BitmapFont;

const GLYPH_ROWS: usize = 7;
const GLYPH_COLS: u32 = 5;
const GLYPH_ADVANCE: u32 = 6;

impl BitmapFont {
    pub fn measure(&self, text: &str, size_px: f32) -> (u32, u32) {
        let count = text.chars().count() as u32;
        if count == 0 {
            return (0, 0);
        }
        let scale = cell_scale(size_px);
        let width_units = count * GLYPH_ADVANCE - 1;
        (
            (width_units as f32 * scale).ceil() as u32,
            (GLYPH_ROWS as f32 * scale).ceil() as u32,
        )
    }

    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        color: Rgb<u8>,
        x: i32,
        y: i32,
        size_px: f32,
        text: &str,
    ) {
        let scale = cell_scale(size_px);

        for (ci, c) in text.chars().enumerate() {
            let rows = glyph(c);
            let cell_x = ci as u32 * GLYPH_ADVANCE;
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_COLS {
                    if bits & (0b1_0000 >> col) == 0 {
                        continue;
                    }
                    fill_scaled_cell(
                        canvas,
                        color,
                        x,
                        y,
                        cell_x + col,
                        row as u32,
                        scale,
                    );
                }
            }
        }
    }
}

/// Pixel size to cell scale; a whole cell is GLYPH_ROWS units tall.
fn cell_scale(size_px: f32) -> f32 {
    (size_px.max(1.0)) / GLYPH_ROWS as f32
}

/// Fill the scaled rectangle for one font-unit cell, clipped to the
/// canvas.
fn fill_scaled_cell(
    canvas: &mut RgbImage,
    color: Rgb<u8>,
    origin_x: i32,
    origin_y: i32,
    unit_x: u32,
    unit_y: u32,
    scale: f32,
) {
    let x0 = origin_x + (unit_x as f32 * scale).round() as i32;
    let y0 = origin_y + (unit_y as f32 * scale).round() as i32;
    let x1 = (origin_x + ((unit_x + 1) as f32 * scale).round() as i32).max(x0 + 1);
    let y1 = (origin_y + ((unit_y + 1) as f32 * scale).round() as i32).max(y0 + 1);

    let (width, height) = canvas.dimensions();
    for py in y0.max(0)..y1.min(height as i32) {
        for px in x0.max(0)..x1.min(width as i32) {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// 5×7 glyph rows, most significant of the low five bits = leftmost
/// column. Unknown characters render as a hollow box.
fn glyph(c: char) -> [u8; GLYPH_ROWS] {
    let c = if c.is_ascii_lowercase() {
        c.to_ascii_uppercase()
    } else {
        c
    };
    match c {
        ' ' => [0; 7],
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
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
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
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        '"' => [0b01010, 0b01010, 0b01010, 0b00000, 0b00000, 0b00000, 0b00000],
        '#' => [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
        '$' => [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100],
        '%' => [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011],
        '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
        '\'' => [0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        '*' => [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00100, 0b01000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        ';' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b00100, 0b01000],
        '<' => [0b00010, 0b00100, 0b01000, 0b10000, 0b01000, 0b00100, 0b00010],
        '=' => [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000],
        '>' => [0b01000, 0b00100, 0b00010, 0b00001, 0b00010, 0b00100, 0b01000],
        '?' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100],
        '@' => [0b01110, 0b10001, 0b00001, 0b01101, 0b10101, 0b10101, 0b01110],
        '[' => [0b01110, 0b01000, 0b01000, 0b01000, 0b01000, 0b01000, 0b01110],
        ']' => [0b01110, 0b00010, 0b00010, 0b00010, 0b00010, 0b00010, 0b01110],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_with_no_paths_falls_back_to_bitmap() {
        let font = PageFont::resolve(&[]);
        assert!(matches!(font, PageFont::Bitmap(_)));
    }

    #[test]
    fn resolve_with_bogus_paths_falls_back_to_bitmap() {
        let font = PageFont::resolve(&[
            PathBuf::from("/no/such/font.ttf"),
            PathBuf::from("/also/missing.ttf"),
        ]);
        assert!(matches!(font, PageFont::Bitmap(_)));
    }

    #[test]
    fn bitmap_measure_scales_with_size() {
        let font = BitmapFont;
        let (w_small, h_small) = font.measure("HELLO", 7.0);
        let (w_big, h_big) = font.measure("HELLO", 28.0);
        assert_eq!(h_small, 7);
        assert_eq!(h_big, 28);
        assert!(w_big >= w_small * 3, "{w_small} -> {w_big}");
    }

    #[test]
    fn bitmap_measure_empty_text_is_zero() {
        assert_eq!(BitmapFont.measure("", 20.0), (0, 0));
    }

    #[test]
    fn bitmap_draw_marks_pixels_within_extent() {
        let font = BitmapFont;
        let mut canvas = RgbImage::from_pixel(100, 40, Rgb([255, 255, 255]));
        let (tw, th) = font.measure("A", 21.0);

        font.draw(&mut canvas, Rgb([0, 0, 0]), 10, 5, 21.0, "A");

        let mut marked = 0u32;
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.get_pixel(x, y).0 == [0, 0, 0] {
                    marked += 1;
                    assert!(
                        x >= 10 && x < 10 + tw && y >= 5 && y < 5 + th,
                        "ink outside measured extent at ({x},{y})"
                    );
                }
            }
        }
        assert!(marked > 0, "glyph drew nothing");
    }

    #[test]
    fn bitmap_draw_clips_at_canvas_edges() {
        let font = BitmapFont;
        let mut canvas = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        // Must not panic drawing partially (or wholly) off-canvas.
        font.draw(&mut canvas, Rgb([0, 0, 0]), -5, -5, 14.0, "XY");
        font.draw(&mut canvas, Rgb([0, 0, 0]), 8, 8, 14.0, "XY");
    }
}
