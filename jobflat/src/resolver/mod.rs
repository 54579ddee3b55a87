// Depth-bounded reference resolution over flat documents

use crate::error::Result;
use crate::naming::{NamingPolicy, RefKind, SuffixConvention};
use crate::source::{CollectionSource, RootQuery};
use bson::{Bson, Document};
use std::collections::BTreeSet;

/// Default number of reference levels to inline.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Resolves reference fields on root documents by fetching and embedding the
/// documents they point at, up to a bounded depth.
///
/// Inputs are never modified: each output is a new document equal to its
/// input plus one embed field per resolved reference. The original
/// `...ID`/`...IDs` fields are left in place. Store failures propagate as
/// errors; a missing relation or a malformed reference value is skipped and
/// sibling fields continue.
pub struct Resolver<'a> {
    source: &'a dyn CollectionSource,
    policy: Box<dyn NamingPolicy>,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a dyn CollectionSource) -> Self {
        Resolver {
            source,
            policy: Box::new(SuffixConvention),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Swap the naming convention for an explicit relation table (or any
    /// other policy) without touching the traversal.
    pub fn with_policy(mut self, policy: impl NamingPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Fetch the first root documents of `collection` and resolve each.
    /// If the root fetch fails the whole call errors; callers never see a
    /// partial batch.
    pub fn resolve_batch(&self, collection: &str, query: &RootQuery) -> Result<Vec<Document>> {
        let roots = self.source.fetch_roots(collection, query)?;
        log::info!(
            "Resolving {} root documents from {collection}",
            roots.len()
        );
        self.resolve_documents(&roots)
    }

    /// Resolve a set of already-fetched root documents, in input order.
    pub fn resolve_documents(&self, roots: &[Document]) -> Result<Vec<Document>> {
        let names = self.source.collection_names()?;
        roots
            .iter()
            .map(|doc| self.resolve_document(doc, &names, self.max_depth))
            .collect()
    }

    fn resolve_document(
        &self,
        doc: &Document,
        names: &BTreeSet<String>,
        depth: usize,
    ) -> Result<Document> {
        let mut resolved = doc.clone();
        if depth == 0 {
            return Ok(resolved);
        }

        // Walk the input's fields, not the output's: embeds added below are
        // never themselves scanned at this level.
        for (field, value) in doc.iter() {
            let reference = match self.policy.classify(field) {
                Some(reference) => reference,
                None => continue,
            };
            if !names.contains(&reference.collection) {
                // No such relation in this store
                continue;
            }

            match reference.kind {
                RefKind::Single => {
                    if lookup_id(value).is_none() {
                        log::warn!("Skipping {field}: value is not an identifier");
                        continue;
                    }
                    if let Some(target) = self.source.fetch_by_id(&reference.collection, value)? {
                        // Singly-embedded documents carry their own
                        // references one level deeper.
                        let embedded = self.resolve_document(&target, names, depth - 1)?;
                        resolved.insert(reference.embed_field, embedded);
                    }
                }
                RefKind::Multi => {
                    let ids: Vec<Bson> = match value {
                        Bson::Array(items) => items
                            .iter()
                            .filter(|item| lookup_id(item).is_some())
                            .cloned()
                            .collect(),
                        _ => {
                            log::warn!("Skipping {field}: value is not an identifier array");
                            continue;
                        }
                    };
                    let targets = self
                        .source
                        .fetch_many_by_ids(&reference.collection, &ids)?;
                    // Attached even when empty; array embeds are not recursed
                    resolved.insert(
                        reference.embed_field,
                        Bson::Array(targets.into_iter().map(Bson::Document).collect()),
                    );
                }
            }
        }

        Ok(resolved)
    }
}

/// Values accepted as document identifiers. ObjectId is the native id type;
/// string ids appear in older collections.
fn lookup_id(value: &Bson) -> Option<&Bson> {
    match value {
        Bson::ObjectId(_) | Bson::String(_) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::naming::RelationMap;
    use crate::source::MemorySource;
    use bson::doc;

    fn job_store() -> MemorySource {
        MemorySource::new()
            .with_collection(
                "Job",
                vec![doc! {
                    "_id": "j1",
                    "no": 42,
                    "status": "open",
                    "jobLocationID": "loc1",
                    "technicianProfileIDs": ["t1", "t2"],
                }],
            )
            .with_collection(
                "JobLocation",
                vec![doc! {
                    "_id": "loc1",
                    "customerID": "c1",
                    "name": "Site A",
                }],
            )
            .with_collection(
                "Customer",
                vec![doc! { "_id": "c1", "name": "Acme" }],
            )
            .with_collection(
                "TechnicianProfile",
                vec![doc! { "_id": "t1", "firstName": "Nok" }],
            )
    }

    #[test]
    fn test_no_reference_fields_is_noop() {
        let source = MemorySource::new().with_collection(
            "Job",
            vec![doc! { "_id": "j1", "status": "open", "priority": 3 }],
        );
        let input = vec![doc! { "_id": "j1", "status": "open", "priority": 3 }];

        let resolved = Resolver::new(&source).resolve_documents(&input).unwrap();
        assert_eq!(resolved, input);
    }

    #[test]
    fn test_unknown_collection_skipped_without_fetch() {
        let source = MemorySource::new().with_collection(
            "Job",
            vec![doc! { "_id": "j1", "warehouseID": "w1" }],
        );
        let input = vec![doc! { "_id": "j1", "warehouseID": "w1" }];

        let resolved = Resolver::new(&source).resolve_documents(&input).unwrap();
        assert_eq!(resolved, input);
        assert_eq!(source.fetches(), 0);
    }

    #[test]
    fn test_single_reference_embedded() {
        let source = job_store();
        let input = vec![doc! { "_id": "x", "jobLocationID": "loc1" }];

        let resolved = Resolver::new(&source)
            .with_max_depth(1)
            .resolve_documents(&input)
            .unwrap();

        let job = &resolved[0];
        // Original field untouched
        assert_eq!(job.get_str("jobLocationID").unwrap(), "loc1");
        let location = job.get_document("jobLocation").unwrap();
        assert_eq!(location.get_str("name").unwrap(), "Site A");
        // Depth 1: the location's own customerID is not resolved
        assert!(location.get("customer").is_none());
    }

    #[test]
    fn test_single_reference_no_match_attaches_nothing() {
        let source = job_store();
        let input = vec![doc! { "_id": "x", "jobLocationID": "nope" }];

        let resolved = Resolver::new(&source).resolve_documents(&input).unwrap();
        assert!(resolved[0].get("jobLocation").is_none());
    }

    #[test]
    fn test_multi_reference_partial_match() {
        let source = job_store();
        // t2 does not exist; only t1 comes back
        let input = vec![doc! { "_id": "x", "technicianProfileIDs": ["t1", "t2"] }];

        let resolved = Resolver::new(&source).resolve_documents(&input).unwrap();
        let technicians = resolved[0].get_array("technicianProfiles").unwrap();
        assert_eq!(technicians.len(), 1);
        match &technicians[0] {
            Bson::Document(doc) => assert_eq!(doc.get_str("firstName").unwrap(), "Nok"),
            other => panic!("expected embedded document, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_reference_zero_matches_attaches_empty_array() {
        let source = job_store();
        let input = vec![doc! { "_id": "x", "technicianProfileIDs": ["ghost"] }];

        let resolved = Resolver::new(&source).resolve_documents(&input).unwrap();
        let technicians = resolved[0].get_array("technicianProfiles").unwrap();
        assert!(technicians.is_empty());
    }

    #[test]
    fn test_malformed_values_skipped_siblings_resolve() {
        let source = job_store();
        let input = vec![doc! {
            "_id": "x",
            "jobLocationID": 17,
            "technicianProfileIDs": ["t1"],
        }];

        let resolved = Resolver::new(&source).resolve_documents(&input).unwrap();
        let job = &resolved[0];
        assert!(job.get("jobLocation").is_none());
        assert_eq!(job.get_array("technicianProfiles").unwrap().len(), 1);
    }

    #[test]
    fn test_depth_two_end_to_end() {
        let source = job_store();

        let resolved = Resolver::new(&source)
            .resolve_batch("Job", &RootQuery::default())
            .unwrap();
        assert_eq!(resolved.len(), 1);

        let job = &resolved[0];
        let location = job.get_document("jobLocation").unwrap();
        assert_eq!(location.get_str("name").unwrap(), "Site A");
        // Level 2: the embedded location gained its customer
        let customer = location.get_document("customer").unwrap();
        assert_eq!(customer.get_str("name").unwrap(), "Acme");
        // Level 3 would require customer's own references; none exist here,
        // and the location's customerID field survives untouched
        assert_eq!(location.get_str("customerID").unwrap(), "c1");

        let row = flatten(job);
        assert_eq!(row["jobLocation_name"], Bson::String("Site A".into()));
        assert_eq!(
            row["jobLocation_customer_name"],
            Bson::String("Acme".into())
        );
        assert_eq!(row["technicianProfiles_count"], Bson::Int64(1));
        assert_eq!(
            row["technicianProfiles_0_firstName"],
            Bson::String("Nok".into())
        );
    }

    #[test]
    fn test_array_embeds_are_not_recursed() {
        // Technician documents carry their own single reference; documents
        // embedded through a multi reference stay unresolved.
        let source = MemorySource::new()
            .with_collection(
                "Job",
                vec![doc! { "_id": "j1", "technicianProfileIDs": ["t1"] }],
            )
            .with_collection(
                "TechnicianProfile",
                vec![doc! { "_id": "t1", "userID": "u1" }],
            )
            .with_collection("User", vec![doc! { "_id": "u1", "name": "Nok" }]);
        let input = vec![doc! { "_id": "j1", "technicianProfileIDs": ["t1"] }];

        let resolved = Resolver::new(&source).resolve_documents(&input).unwrap();
        let technicians = resolved[0].get_array("technicianProfiles").unwrap();
        match &technicians[0] {
            Bson::Document(tech) => {
                assert_eq!(tech.get_str("userID").unwrap(), "u1");
                assert!(tech.get("user").is_none());
            }
            other => panic!("expected embedded document, got {other:?}"),
        }
    }

    #[test]
    fn test_depth_bound_stops_level_two_references() {
        let source = job_store();
        let input = vec![doc! { "_id": "x", "jobLocationID": "loc1" }];

        // Depth 2 resolves the location's customer; the customer's own
        // reference fields (had it any) would stay untouched
        let resolved = Resolver::new(&source).resolve_documents(&input).unwrap();
        let location = resolved[0].get_document("jobLocation").unwrap();
        assert!(location.get_document("customer").is_ok());
    }

    #[test]
    fn test_failing_source_propagates_error() {
        let source = MemorySource::failing();
        let result = Resolver::new(&source).resolve_batch("Job", &RootQuery::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_relation_map_policy() {
        let source = job_store();
        let input = vec![doc! { "_id": "x", "technicianProfileIDs": ["t1"] }];

        let policy = RelationMap::new().with(
            "technicianProfileIDs",
            "TechnicianProfile",
            "technicians",
            RefKind::Multi,
        );
        let resolved = Resolver::new(&source)
            .with_policy(policy)
            .resolve_documents(&input)
            .unwrap();
        assert_eq!(resolved[0].get_array("technicians").unwrap().len(), 1);
    }
}
