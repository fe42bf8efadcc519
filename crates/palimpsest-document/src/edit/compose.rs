// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text compositor — draws replacement text onto the erased page.
//
// For each validated edit with text: resolve the font size (explicit,
// else a fixed fraction of the region height with a legibility floor),
// parse the colour, measure the rendered extent, and centre it within
// the target region. OCR boxes hug the original glyphs, so replacement
// text of a different width pinned to the corner looks wrong — centred
// placement is the detail that makes edits pass as print.

use image::{Rgb, RgbImage};
use palimpsest_core::PipelineConfig;
use palimpsest_core::ValidatedEdit;
use palimpsest_core::error::{PalimpsestError, Result};
use tracing::{debug, info, instrument};

use super::font::PageFont;

/// Draws replacement text onto the erased working page.
///
/// Colour policy: malformed colour strings fail the whole submission
/// with [`PalimpsestError::InvalidColor`] — never a silent fall-back to
/// black. Colours are validated for every edit before any ink goes
/// down, so a bad one cannot leave the page half-composed.
pub struct TextCompositor {
    font: PageFont,
    font_height_fraction: f32,
    min_font_px: u32,
}

/// One edit pre-flighted and ready to draw.
struct PlacedText<'a> {
    text: &'a str,
    color: Rgb<u8>,
    size_px: f32,
    x: i32,
    y: i32,
}

impl TextCompositor {
    /// Build a compositor, resolving the font from the configured paths
    /// (missing fonts fall back to the built-in face — see [`PageFont`]).
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            font: PageFont::resolve(&config.font_paths),
            font_height_fraction: config.font_height_fraction,
            min_font_px: config.min_font_px,
        }
    }

    /// Build a compositor around an already-resolved font.
    pub fn with_font(font: PageFont, config: &PipelineConfig) -> Self {
        Self {
            font,
            font_height_fraction: config.font_height_fraction,
            min_font_px: config.min_font_px,
        }
    }

    /// Draw every non-empty edit onto the page in place.
    ///
    /// Edits with empty `new_text` are erase-only and draw nothing.
    /// Regions never overlap after resolution, so draw order cannot
    /// affect the result.
    #[instrument(skip_all, fields(edit_count = edits.len()))]
    pub fn compose(&self, page: &mut RgbImage, edits: &[ValidatedEdit]) -> Result<()> {
        // Pre-flight all edits before drawing anything, so a malformed
        // colour cannot leave the page partially composed. Colours are
        // checked on erase-only edits too: a bad colour is a client bug
        // whether or not text gets drawn.
        let mut placements = Vec::with_capacity(edits.len());
        for edit in edits {
            let color = parse_hex_color(edit.color.as_deref().unwrap_or("#000000"))
                .map_err(|detail| PalimpsestError::InvalidColor {
                    index: edit.index,
                    value: edit.color.clone().unwrap_or_default(),
                    detail,
                })?;

            if edit.new_text.is_empty() {
                continue;
            }

            let size_px = self.resolve_font_size(edit);
            let (tw, th) = self.font.measure(&edit.new_text, size_px);

            // Centre the measured extent within the region; clamp to the
            // page so oversized text stays drawable.
            let x = (i64::from(edit.x) + (i64::from(edit.w) - i64::from(tw)) / 2).max(0);
            let y = (i64::from(edit.y) + (i64::from(edit.h) - i64::from(th)) / 2).max(0);

            debug!(
                index = edit.index,
                size_px,
                text_w = tw,
                text_h = th,
                x,
                y,
                "Replacement text placed"
            );
            placements.push(PlacedText {
                text: &edit.new_text,
                color,
                size_px,
                x: x as i32,
                y: y as i32,
            });
        }

        for placed in &placements {
            self.font.draw(
                page,
                placed.color,
                placed.x,
                placed.y,
                placed.size_px,
                placed.text,
            );
        }

        info!(drawn = placements.len(), "Composition complete");
        Ok(())
    }

    /// Explicit positive size wins; otherwise a fraction of the region
    /// height, floored at the minimum legible size.
    fn resolve_font_size(&self, edit: &ValidatedEdit) -> f32 {
        let derived = match edit.font_size {
            Some(explicit) => explicit as f32,
            None => edit.h as f32 * self.font_height_fraction,
        };
        derived.max(self.min_font_px as f32)
    }
}

/// Parse a `#RRGGBB` hex colour (leading `#` optional) into RGB
/// channels. Returns a human-readable reason on malformed input.
pub fn parse_hex_color(value: &str) -> std::result::Result<Rgb<u8>, String> {
    let digits = value.strip_prefix('#').unwrap_or(value);
    if !digits.is_ascii() {
        return Err(format!("non-hex digits in {value:?}"));
    }
    if digits.len() != 6 {
        return Err(format!(
            "expected 6 hex digits, got {} in {value:?}",
            digits.len()
        ));
    }

    let mut channels = [0u8; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| format!("non-hex digits in {value:?}"))?;
    }
    Ok(Rgb(channels))
}
