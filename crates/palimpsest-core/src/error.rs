// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Palimpsest.

use thiserror::Error;

use crate::types::RegionFault;

/// Top-level error type for all Palimpsest operations.
///
/// Every failure surfaces as a labelled kind with a message — callers
/// (typically a transport layer) map these to structured responses.
#[derive(Debug, Error)]
pub enum PalimpsestError {
    /// Unreadable, corrupt, or unsupported upload artifact. Terminal —
    /// retrying the same bytes cannot succeed.
    #[error("page ingest failed: {0}")]
    Ingest(String),

    /// The text-detection capability failed. Terminal for the request;
    /// the whole analysis may be retried.
    #[error("text detection failed: {0}")]
    Detection(String),

    /// One or more edit regions were out of bounds or degenerate.
    /// Carries every fault in the batch, not just the first.
    #[error("invalid edit regions: {}", join_faults(.0))]
    InvalidRegion(Vec<RegionFault>),

    /// A malformed color string in an edit. Rejected rather than
    /// silently defaulted, so client bugs stay visible.
    #[error("invalid color {value:?} in edit {index}: {detail}")]
    InvalidColor {
        index: usize,
        value: String,
        detail: String,
    },

    /// The content-aware fill capability could not process the
    /// page/mask pairing.
    #[error("content erase failed: {0}")]
    Erase(String),

    /// Export document assembly failed.
    #[error("page assembly failed: {0}")]
    Assembly(String),

    /// Unknown or unreadable session.
    #[error("session error: {0}")]
    Session(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PalimpsestError>;

fn join_faults(faults: &[RegionFault]) -> String {
    faults
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_region_lists_every_fault() {
        let err = PalimpsestError::InvalidRegion(vec![
            RegionFault {
                index: 0,
                detail: "zero width".into(),
            },
            RegionFault {
                index: 3,
                detail: "outside page bounds".into(),
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("edit 0: zero width"), "{message}");
        assert!(message.contains("edit 3: outside page bounds"), "{message}");
    }

    #[test]
    fn io_errors_convert() {
        fn read_missing() -> Result<Vec<u8>> {
            Ok(std::fs::read("/definitely/not/here")?)
        }
        assert!(matches!(
            read_missing(),
            Err(PalimpsestError::Io(_))
        ));
    }
}
