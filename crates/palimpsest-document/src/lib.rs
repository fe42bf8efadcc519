// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// palimpsest-document — The document edit pipeline.
//
// Turns an uploaded page (image or first PDF page) into a canonical
// working raster, indexes the printed words on it, and applies
// erase-and-retype edits: region resolution, content-aware erase that
// keeps surrounding texture, centred replacement text, and PDF export
// at exact pixel dimensions.

pub mod detect;
pub mod edit;
pub mod export;
pub mod ingest;
pub mod service;
pub mod session;

// Re-export the primary types so callers can use `palimpsest_document::PageIngestor` etc.
pub use detect::{TextDetector, WordIndex};
pub use edit::compose::TextCompositor;
pub use edit::erase::{ContentEraser, ContentFill, DiffusionFill};
pub use edit::region::{EditRegionResolver, EraseMask};
pub use export::PageExporter;
pub use ingest::PageIngestor;
pub use service::EditService;
pub use session::{FsSessionStore, SessionStore};

#[cfg(feature = "ocr")]
pub use detect::ocrs_engine::OcrsDetector;
