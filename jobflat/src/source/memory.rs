use crate::error::{JobFlatError, Result};
use crate::source::{CollectionSource, RootQuery};
use bson::{Bson, Document};
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

/// In-memory `CollectionSource` for tests, demos, and offline fixtures.
/// Documents are kept in insertion order per collection.
#[derive(Debug, Default)]
pub struct MemorySource {
    collections: BTreeMap<String, Vec<Document>>,
    fail: bool,
    fetch_count: Cell<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every call errors, for exercising failure paths.
    pub fn failing() -> Self {
        MemorySource {
            fail: true,
            ..Self::default()
        }
    }

    pub fn insert(&mut self, collection: &str, doc: Document) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    pub fn with_collection(mut self, name: &str, docs: Vec<Document>) -> Self {
        self.collections.insert(name.to_string(), docs);
        self
    }

    /// Number of fetch calls served so far (point, batch, and root fetches).
    pub fn fetches(&self) -> usize {
        self.fetch_count.get()
    }

    fn guard(&self) -> Result<()> {
        if self.fail {
            return Err(JobFlatError::Other(
                "memory source: injected failure".to_string(),
            ));
        }
        Ok(())
    }

    fn record_fetch(&self) {
        self.fetch_count.set(self.fetch_count.get() + 1);
    }

    fn in_window(doc: &Document, query: &RootQuery) -> bool {
        if query.created_after.is_none() && query.created_before.is_none() {
            return true;
        }
        let created = match doc.get("createdAt") {
            Some(Bson::DateTime(dt)) => dt.to_chrono(),
            _ => return false,
        };
        if let Some(after) = query.created_after {
            if created < after {
                return false;
            }
        }
        if let Some(before) = query.created_before {
            if created > before {
                return false;
            }
        }
        true
    }
}

impl CollectionSource for MemorySource {
    fn collection_names(&self) -> Result<BTreeSet<String>> {
        self.guard()?;
        Ok(self.collections.keys().cloned().collect())
    }

    fn fetch_by_id(&self, collection: &str, id: &Bson) -> Result<Option<Document>> {
        self.guard()?;
        self.record_fetch();
        let docs = match self.collections.get(collection) {
            Some(docs) => docs,
            None => return Ok(None),
        };
        Ok(docs.iter().find(|doc| doc.get("_id") == Some(id)).cloned())
    }

    fn fetch_many_by_ids(&self, collection: &str, ids: &[Bson]) -> Result<Vec<Document>> {
        self.guard()?;
        self.record_fetch();
        let docs = match self.collections.get(collection) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };
        Ok(docs
            .iter()
            .filter(|doc| doc.get("_id").map(|id| ids.contains(id)).unwrap_or(false))
            .cloned()
            .collect())
    }

    fn fetch_roots(&self, collection: &str, query: &RootQuery) -> Result<Vec<Document>> {
        self.guard()?;
        self.record_fetch();
        let docs = match self.collections.get(collection) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };
        Ok(docs
            .iter()
            .filter(|doc| Self::in_window(doc, query))
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use chrono::TimeZone;

    fn day(day: u32) -> bson::DateTime {
        bson::DateTime::from_chrono(chrono::Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap())
    }

    fn setup() -> MemorySource {
        MemorySource::new().with_collection(
            "Job",
            vec![
                doc! { "_id": "j1", "no": 1, "createdAt": day(1) },
                doc! { "_id": "j2", "no": 2, "createdAt": day(10) },
                doc! { "_id": "j3", "no": 3, "createdAt": day(20) },
            ],
        )
    }

    #[test]
    fn test_fetch_by_id() {
        let source = setup();
        let doc = source
            .fetch_by_id("Job", &Bson::String("j2".into()))
            .unwrap()
            .unwrap();
        assert_eq!(doc.get_i32("no").unwrap(), 2);
        assert!(source
            .fetch_by_id("Job", &Bson::String("missing".into()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_fetch_many_preserves_store_order() {
        let source = setup();
        let ids = vec![Bson::String("j3".into()), Bson::String("j1".into())];
        let docs = source.fetch_many_by_ids("Job", &ids).unwrap();
        // Store order, not input order
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get_str("_id").unwrap(), "j1");
        assert_eq!(docs[1].get_str("_id").unwrap(), "j3");
    }

    #[test]
    fn test_fetch_roots_limit_and_window() {
        let source = setup();

        let first_two = source
            .fetch_roots("Job", &RootQuery::with_limit(2))
            .unwrap();
        assert_eq!(first_two.len(), 2);

        let mut query = RootQuery::with_limit(10);
        query.created_after = Some(chrono::Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap());
        query.created_before = Some(chrono::Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap());
        let windowed = source.fetch_roots("Job", &query).unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].get_str("_id").unwrap(), "j2");
    }

    #[test]
    fn test_failing_source_errors_everywhere() {
        let source = MemorySource::failing();
        assert!(source.collection_names().is_err());
        assert!(source.fetch_roots("Job", &RootQuery::default()).is_err());
    }

    #[test]
    fn test_fetch_counter() {
        let source = setup();
        assert_eq!(source.fetches(), 0);
        source
            .fetch_by_id("Job", &Bson::String("j1".into()))
            .unwrap();
        source.fetch_many_by_ids("Job", &[]).unwrap();
        assert_eq!(source.fetches(), 2);
    }
}
