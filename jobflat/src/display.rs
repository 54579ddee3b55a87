// Console display helpers for inspecting raw documents

use bson::{Bson, Document};

/// Replace complex values with short human-readable summaries: nested
/// documents become `"Object: field1, field2"`, arrays of documents become
/// `"Array of N objects"`, `_id` is stringified, everything else passes
/// through unchanged. Display-only; never part of the resolve pipeline.
pub fn summarize(doc: &Document) -> Document {
    let mut out = Document::new();
    for (key, value) in doc.iter() {
        let shown = if key == "_id" {
            Bson::String(crate::export::render_scalar(value))
        } else {
            match value {
                Bson::Document(nested) => {
                    let fields: Vec<&str> = nested.keys().map(|k| k.as_str()).collect();
                    Bson::String(format!("Object: {}", fields.join(", ")))
                }
                Bson::Array(items) if matches!(items.first(), Some(Bson::Document(_))) => {
                    Bson::String(format!("Array of {} objects", items.len()))
                }
                other => other.clone(),
            }
        };
        out.insert(key.clone(), shown);
    }
    out
}

/// Short BSON type name for field listings.
pub fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        _ => "other",
    }
}
