// CSV and JSON sinks for resolved job data

use crate::error::Result;
use crate::flatten::FlatRow;
use bson::{Bson, Document};
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;

/// Render a scalar for delimited output. Object ids render as their hex
/// string, datetimes as RFC 3339, null as the empty field.
pub fn render_scalar(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::DateTime(dt) => dt.to_chrono().to_rfc3339(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        Bson::Double(n) => n.to_string(),
        Bson::Boolean(b) => b.to_string(),
        Bson::Null => String::new(),
        other => other.to_string(),
    }
}

/// Write flattened rows as delimited text: one column per distinct key
/// observed across all rows, in first-observed order. Keys missing from a
/// row render as empty fields.
pub fn write_csv<W: Write>(writer: W, rows: &[FlatRow]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut columns: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.as_str());
            }
        }
    }

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&columns)?;
    for row in rows {
        out.write_record(
            columns
                .iter()
                .map(|column| row.get(*column).map(render_scalar).unwrap_or_default()),
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Convert a resolved document tree to JSON with the export encoding rules:
/// ObjectId becomes its hex string, DateTime an RFC 3339 string.
pub fn document_to_json(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(key, value)| (key.clone(), bson_to_json(value)))
            .collect(),
    )
}

fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(dt.to_chrono().to_rfc3339()),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(n) => Value::from(*n),
        Bson::Int64(n) => Value::from(*n),
        Bson::Double(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

/// Serialize the unflattened resolved trees as a pretty-printed JSON array.
pub fn write_json_tree<W: Write>(mut writer: W, docs: &[Document]) -> Result<()> {
    let values: Vec<Value> = docs.iter().map(document_to_json).collect();
    serde_json::to_writer_pretty(&mut writer, &values)?;
    writer.write_all(b"\n")?;
    Ok(())
}
