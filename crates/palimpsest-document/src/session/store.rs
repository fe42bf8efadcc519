// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session store — persists the artifacts of one editing session as named
// byte blobs. The filesystem backend lays sessions out as one directory
// per session id with one file per blob, so a session survives a process
// restart and can be inspected with ordinary tools.

use std::path::{Path, PathBuf};

use palimpsest_core::SessionId;
use palimpsest_core::error::{PalimpsestError, Result};
use tracing::{debug, instrument};

/// Canonical working page, PNG-encoded.
pub const BLOB_PAGE: &str = "page.png";
/// Most recent export; overwritten by each edit submission.
pub const BLOB_EXPORT: &str = "edited.pdf";
/// Session metadata, JSON-encoded.
pub const BLOB_SESSION: &str = "session.json";

/// Byte-blob persistence for editing sessions.
///
/// Blob names are flat strings chosen by the caller ([`BLOB_PAGE`] and
/// friends). Writing an existing blob replaces it.
pub trait SessionStore: Send + Sync {
    fn put(&self, session: &SessionId, blob: &str, bytes: &[u8]) -> Result<()>;

    /// Read a blob back. A missing session or blob is a
    /// [`PalimpsestError::Session`] error.
    fn get(&self, session: &SessionId, blob: &str) -> Result<Vec<u8>>;

    fn contains(&self, session: &SessionId, blob: &str) -> bool;
}

/// Filesystem-backed [`SessionStore`] rooted at a single directory.
pub struct FsSessionStore {
    root: PathBuf,
}

impl FsSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, session: &SessionId, blob: &str) -> PathBuf {
        self.root.join(session.to_string()).join(blob)
    }
}

impl SessionStore for FsSessionStore {
    #[instrument(skip(self, bytes), fields(session = %session, blob, bytes_len = bytes.len()))]
    fn put(&self, session: &SessionId, blob: &str, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(session, blob);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), "Blob written");
        Ok(())
    }

    #[instrument(skip(self), fields(session = %session, blob))]
    fn get(&self, session: &SessionId, blob: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(session, blob);
        if !path.is_file() {
            return Err(PalimpsestError::Session(format!(
                "no blob {blob:?} for session {session}"
            )));
        }
        Ok(std::fs::read(&path)?)
    }

    fn contains(&self, session: &SessionId, blob: &str) -> bool {
        self.blob_path(session, blob).is_file()
    }
}

/// Remove every blob belonging to sessions older than the newest `keep`.
///
/// Sessions are ordered by directory modification time; ties keep both.
/// Used by long-running hosts to bound disk usage.
pub fn prune_oldest(root: &Path, keep: usize) -> Result<usize> {
    let mut sessions: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let modified = entry.metadata()?.modified()?;
            sessions.push((modified, entry.path()));
        }
    }

    if sessions.len() <= keep {
        return Ok(0);
    }

    sessions.sort_by_key(|(modified, _)| *modified);
    let stale = sessions.len() - keep;
    for (_, path) in sessions.drain(..stale) {
        std::fs::remove_dir_all(&path)?;
        debug!(path = %path.display(), "Stale session pruned");
    }
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        let session = SessionId::new();

        store.put(&session, BLOB_PAGE, b"not really a png").unwrap();
        assert!(store.contains(&session, BLOB_PAGE));
        assert_eq!(store.get(&session, BLOB_PAGE).unwrap(), b"not really a png");
    }

    #[test]
    fn overwrite_replaces_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        let session = SessionId::new();

        store.put(&session, BLOB_EXPORT, b"first").unwrap();
        store.put(&session, BLOB_EXPORT, b"second").unwrap();
        assert_eq!(store.get(&session, BLOB_EXPORT).unwrap(), b"second");
    }

    #[test]
    fn missing_blob_is_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        let session = SessionId::new();

        match store.get(&session, BLOB_PAGE) {
            Err(PalimpsestError::Session(_)) => {}
            other => panic!("expected Session error, got {other:?}"),
        }
        assert!(!store.contains(&session, BLOB_PAGE));
    }

    #[test]
    fn sessions_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        let a = SessionId::new();
        let b = SessionId::new();

        store.put(&a, BLOB_PAGE, b"page-a").unwrap();
        assert!(!store.contains(&b, BLOB_PAGE));
    }

    #[test]
    fn prune_keeps_newest_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());

        let old = SessionId::new();
        store.put(&old, BLOB_PAGE, b"old").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let new = SessionId::new();
        store.put(&new, BLOB_PAGE, b"new").unwrap();

        let removed = prune_oldest(dir.path(), 1).unwrap();
        assert_eq!(removed, 1);
        assert!(!store.contains(&old, BLOB_PAGE));
        assert!(store.contains(&new, BLOB_PAGE));
    }

    #[test]
    fn prune_on_missing_root_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-created");
        assert_eq!(prune_oldest(&missing, 4).unwrap(), 0);
    }
}
