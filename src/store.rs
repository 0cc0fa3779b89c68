//! Storage abstraction for indexed fragments.
//!
//! The [`FragmentStore`] trait is everything the retrieval pipeline needs
//! from the full-text index. [`SqliteStore`](crate::sqlite_store::SqliteStore)
//! is the production backend; tests plug in fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Fragment;

#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Replace the entire fragment set with `fragments`.
    ///
    /// Readers must observe either the old set or the new one, never a
    /// partially deleted store.
    async fn rebuild(&self, fragments: &[Fragment]) -> Result<()>;

    /// Return up to `limit` fragments matching `query` as a literal phrase,
    /// best match first.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Fragment>>;

    /// Number of fragments currently stored.
    async fn count(&self) -> Result<i64>;
}
