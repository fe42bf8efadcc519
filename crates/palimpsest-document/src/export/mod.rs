// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export — assemble edited working pages into a downloadable PDF.

mod pdf;

pub use pdf::PageExporter;
