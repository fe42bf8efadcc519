// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ingest module — artifact decoding, first-page PDF rasterization, and deskew.

pub mod deskew;
pub mod page;

pub use page::PageIngestor;
