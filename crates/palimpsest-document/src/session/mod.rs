// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session persistence — named byte blobs keyed by session id.

mod store;

pub use store::{BLOB_EXPORT, BLOB_PAGE, BLOB_SESSION, FsSessionStore, SessionStore, prune_oldest};
