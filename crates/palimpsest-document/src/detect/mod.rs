// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word index — thin adapter around an external text-detection
// capability. The adapter's whole job is normalization: drop empty or
// low-confidence entries, guarantee non-negative page-pixel
// coordinates, and preserve the detector's ordering so repeated runs on
// the same page are reproducible. No ranking or spatial reasoning
// happens here.

#[cfg(feature = "ocr")]
pub mod ocrs_engine;

use image::RgbImage;
use palimpsest_core::WordBox;
use palimpsest_core::error::Result;
use tracing::{debug, instrument};

/// A raw detection as the external capability reports it: text plus a
/// bounding box and a 0–100 confidence. Coordinates may stick out past
/// the page edge; this module is the only code that depends on this
/// shape.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedWord {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub confidence: f32,
}

/// The external text-detection capability.
///
/// Implementations return words in reading order (or whatever stable
/// order the engine produces) — the adapter preserves it.
pub trait TextDetector: Send + Sync {
    fn detect(&self, page: &RgbImage) -> Result<Vec<DetectedWord>>;
}

/// Normalizing adapter over a [`TextDetector`].
pub struct WordIndex {
    /// Words with confidence below this floor are dropped. Inclusive:
    /// a word exactly at the floor is kept.
    confidence_floor: f32,
}

impl WordIndex {
    pub fn new(confidence_floor: f32) -> Self {
        Self { confidence_floor }
    }

    /// Detect words on the working page and normalize the result.
    ///
    /// Confidence filtering happens here and only here — downstream
    /// components never re-filter.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn detect(
        &self,
        detector: &dyn TextDetector,
        page: &RgbImage,
    ) -> Result<Vec<WordBox>> {
        let raw = detector.detect(page)?;
        let total = raw.len();

        let mut words = Vec::with_capacity(raw.len());
        for entry in raw {
            let text = entry.text.trim();
            if text.is_empty() || entry.confidence < self.confidence_floor {
                continue;
            }

            // Clamp negative origins to the page edge, shrinking the
            // extent by the clipped amount.
            let x = entry.x.max(0);
            let y = entry.y.max(0);
            let w = entry.w - (x - entry.x);
            let h = entry.h - (y - entry.y);
            if w <= 0 || h <= 0 {
                continue;
            }

            words.push(WordBox {
                text: text.to_string(),
                x: x as u32,
                y: y as u32,
                w: w as u32,
                h: h as u32,
                confidence: entry.confidence,
            });
        }

        debug!(total, kept = words.len(), "Word index built");
        Ok(words)
    }
}
