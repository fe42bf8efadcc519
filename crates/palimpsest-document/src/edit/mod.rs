// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit module — region resolution, content-aware erase, and replacement
// text composition.

pub mod compose;
pub mod erase;
pub mod font;
pub mod region;

pub use compose::TextCompositor;
pub use erase::{ContentEraser, ContentFill, DiffusionFill};
pub use font::PageFont;
pub use region::{EditRegionResolver, EraseMask, Resolution};
