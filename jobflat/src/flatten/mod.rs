// Projection of nested document trees into single-level rows

use bson::{Bson, Document};
use std::collections::BTreeMap;

/// One flattened document: underscore-joined key path to scalar value.
/// Produced on demand; no identity or persistence of its own.
pub type FlatRow = BTreeMap<String, Bson>;

/// Array elements beyond this index are dropped from the projection,
/// keeping row width bounded for variable-length arrays.
pub const ARRAY_SAMPLE_LIMIT: usize = 3;

/// Flatten a (possibly deeply nested) document into a single-level mapping.
///
/// Nested documents contribute their fields under a `parent_child` path.
/// Arrays always contribute a `_count` entry; arrays of documents
/// additionally contribute the sub-fields of their first
/// [`ARRAY_SAMPLE_LIMIT`] elements under `path_0`, `path_1`, ... Arrays of
/// scalars contribute the count only. Scalars pass through unchanged.
pub fn flatten(doc: &Document) -> FlatRow {
    let mut row = FlatRow::new();
    flatten_into(doc, "", &mut row);
    row
}

fn flatten_into(doc: &Document, prefix: &str, row: &mut FlatRow) {
    for (key, value) in doc.iter() {
        let path = join_path(prefix, key);
        match value {
            Bson::Document(nested) => flatten_into(nested, &path, row),
            Bson::Array(items) => {
                row.insert(format!("{path}_count"), Bson::Int64(items.len() as i64));
                if let Some(Bson::Document(_)) = items.first() {
                    for (index, item) in items.iter().take(ARRAY_SAMPLE_LIMIT).enumerate() {
                        if let Bson::Document(nested) = item {
                            flatten_into(nested, &format!("{path}_{index}"), row);
                        }
                    }
                }
            }
            scalar => {
                row.insert(path, scalar.clone());
            }
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}_{key}")
    }
}
