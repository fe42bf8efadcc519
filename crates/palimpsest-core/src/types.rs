// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Palimpsest page edit engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one edit workflow (upload → analyse → edit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Supported upload artifact kinds.
///
/// A `Pdf` artifact has its first page rendered to a raster; image kinds
/// are decoded directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Pdf,
    Jpeg,
    Png,
    Tiff,
    Webp,
}

impl ArtifactKind {
    /// Whether this kind is a paged document format (first page is rendered)
    /// rather than a plain raster.
    pub fn is_paged(&self) -> bool {
        matches!(self, Self::Pdf)
    }

    /// Infer the artifact kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// A detected word on the canonical working page.
///
/// Coordinates are top-left page pixels; `w`/`h` are positive extents.
/// Entries below the configured confidence floor or with empty trimmed
/// text never appear in a `WordBox` list — that filtering happens once,
/// at the word-index boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Detector confidence in 0–100.
    pub confidence: f32,
}

/// A caller-supplied replacement instruction.
///
/// Coordinates reference the same pixel space as [`WordBox`] — the
/// canonical working page. Origins may be negative (clients sometimes
/// drag selection rectangles past the page edge); they are clamped
/// during resolution. An empty `new_text` means "erase only, draw
/// nothing".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    #[serde(default)]
    pub new_text: String,
    /// Explicit font size in pixels. When absent (or non-positive), the
    /// size is derived from the region height.
    #[serde(default)]
    pub font_size: Option<i32>,
    /// Hex RGB color ("#RRGGBB"). Defaults to opaque black when absent.
    #[serde(default)]
    pub color: Option<String>,
}

/// An edit request whose region has been clamped to page bounds and
/// verified non-degenerate. Produced only by the region resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEdit {
    /// Position of the originating request in the submitted batch, so
    /// later per-edit errors name the edit the caller actually sent —
    /// rejected regions leave gaps in the validated list.
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub new_text: String,
    pub font_size: Option<u32>,
    pub color: Option<String>,
}

/// Why a single edit region was rejected during resolution.
///
/// Faults are collected across the whole batch rather than failing at
/// the first bad region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFault {
    /// Index of the offending edit in the submitted list.
    pub index: usize,
    pub detail: String,
}

impl std::fmt::Display for RegionFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "edit {}: {}", self.index, self.detail)
    }
}

/// Metadata for one edit session, persisted alongside its blobs.
///
/// The working page is fixed at creation; the export artifact is
/// overwritten on each edit submission. Retention is the caller's
/// policy — sessions carry no expiry of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    /// Canonical working page dimensions in pixels.
    pub page_width: u32,
    pub page_height: u32,
}

impl Session {
    pub fn new(page_width: u32, page_height: u32) -> Self {
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            page_width,
            page_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_round_trips_through_display() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn artifact_kind_from_extension() {
        assert_eq!(ArtifactKind::from_extension("PDF"), Some(ArtifactKind::Pdf));
        assert_eq!(ArtifactKind::from_extension("jpeg"), Some(ArtifactKind::Jpeg));
        assert_eq!(ArtifactKind::from_extension("docx"), None);
    }

    #[test]
    fn only_pdf_is_paged() {
        assert!(ArtifactKind::Pdf.is_paged());
        assert!(!ArtifactKind::Png.is_paged());
        assert!(!ArtifactKind::Tiff.is_paged());
    }

    #[test]
    fn edit_request_deserializes_with_defaults() {
        let parsed: EditRequest =
            serde_json::from_str(r#"{"x": 10, "y": 20, "w": 100, "h": 30}"#).unwrap();
        assert_eq!(parsed.new_text, "");
        assert!(parsed.font_size.is_none());
        assert!(parsed.color.is_none());
    }
}
