//! Passes run after the sweep.

use serde::Serialize;
use tracing::info;

use keepset_store::{RowStore, StoreResult};

/// Work handed the pruned store once the sweep is done.
pub trait PostSweepPass: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the number of rows touched.
    fn run(&self, store: &dyn RowStore) -> StoreResult<u64>;
}

/// A pass that touches nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPass;

impl PostSweepPass for NoopPass {
    fn name(&self) -> &str {
        "noop"
    }

    fn run(&self, _store: &dyn RowStore) -> StoreResult<u64> {
        Ok(0)
    }
}

/// Replaces author email, IP and user agent on every surviving comment.
#[derive(Clone, Debug)]
pub struct ScrubCommentPii {
    email: String,
}

impl ScrubCommentPii {
    /// Scrubbed comments get `commenter@<local_domain>`.
    pub fn new(local_domain: &str) -> Self {
        Self {
            email: format!("commenter@{}", local_domain.trim()),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl PostSweepPass for ScrubCommentPii {
    fn name(&self) -> &str {
        "scrub_comment_pii"
    }

    fn run(&self, store: &dyn RowStore) -> StoreResult<u64> {
        let touched = store.anonymize_comments(&self.email)?;
        info!(comments = touched, email = %self.email, "comment author details scrubbed");
        Ok(touched)
    }
}

/// Outcome of one post-sweep pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub name: String,
    pub rows: u64,
}
