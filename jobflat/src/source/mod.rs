// Read-only access to the backing document store

use crate::error::Result;
use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

pub mod memory;
pub mod mongo;

pub use memory::MemorySource;
pub use mongo::MongoSource;

/// Bounds for the initial root-document fetch: first `limit` documents,
/// optionally restricted to a created-at window.
#[derive(Debug, Clone)]
pub struct RootQuery {
    pub limit: i64,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl RootQuery {
    pub fn with_limit(limit: i64) -> Self {
        RootQuery {
            limit,
            created_after: None,
            created_before: None,
        }
    }
}

impl Default for RootQuery {
    fn default() -> Self {
        RootQuery::with_limit(10)
    }
}

/// The read capability the resolver depends on. Every method returns a
/// `Result` so callers can tell "no related data" apart from "could not
/// reach the store".
pub trait CollectionSource {
    /// Names of all collections in the store.
    fn collection_names(&self) -> Result<BTreeSet<String>>;

    /// Point lookup by `_id`. `Ok(None)` when no document matches.
    fn fetch_by_id(&self, collection: &str, id: &Bson) -> Result<Option<Document>>;

    /// Batched lookup by `_id`, one round trip for the whole id set.
    /// Result order is the store's, not the input's.
    fn fetch_many_by_ids(&self, collection: &str, ids: &[Bson]) -> Result<Vec<Document>>;

    /// The initial bounded set of root documents.
    fn fetch_roots(&self, collection: &str, query: &RootQuery) -> Result<Vec<Document>>;
}
