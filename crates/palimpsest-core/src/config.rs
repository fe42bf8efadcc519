// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tunable settings for the document edit pipeline.
///
/// Passed explicitly into each component — there is no process-global
/// state. The same config value must be used for both the analysis and
/// edit phases of a session: in particular `supersample` fixes the
/// coordinate scale that word boxes and edit regions share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scale factor applied when rendering the first page of a PDF
    /// artifact. All downstream pixel coordinates are measured against
    /// the supersampled page.
    pub supersample: f32,
    /// Words with detector confidence below this floor (0–100) are
    /// dropped at the word-index boundary. Inclusive: a word at exactly
    /// the floor is kept.
    pub confidence_floor: f32,
    /// Padding in pixels added around each edit region in the erase
    /// mask, covering anti-aliased glyph edges left by the original
    /// rendering.
    pub erase_margin: u32,
    /// Neighbourhood radius handed to the content-aware fill capability.
    pub fill_radius: u32,
    /// Fraction of the region height used as the font size when an edit
    /// does not specify one.
    pub font_height_fraction: f32,
    /// Minimum font size in pixels, keeping derived sizes legible.
    pub min_font_px: u32,
    /// Whether to deskew ingested pages.
    pub deskew: bool,
    /// Estimated skew angles below this magnitude (degrees) are left
    /// alone — rotating an already-straight page only costs sharpness.
    pub deskew_min_angle_deg: f32,
    /// DPI used when sizing exported PDF pages from pixel dimensions.
    pub export_dpi: f32,
    /// Preferred TrueType font files, probed in order. When none loads,
    /// composition falls back to the built-in bitmap face.
    pub font_paths: Vec<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            supersample: 2.0,
            confidence_floor: 30.0,
            erase_margin: 4,
            fill_radius: 5,
            font_height_fraction: 0.8,
            min_font_px: 8,
            deskew: true,
            deskew_min_angle_deg: 0.3,
            export_dpi: 150.0,
            font_paths: vec![
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
                PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"),
            ],
        }
    }
}
