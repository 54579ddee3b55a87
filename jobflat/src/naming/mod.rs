// Field-name to collection-name mapping for reference discovery

use std::collections::HashMap;

/// Whether a reference field holds one identifier or an array of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Single,
    Multi,
}

/// A classified reference field: which collection to fetch from and which
/// field the fetched document(s) embed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub collection: String,
    pub embed_field: String,
    pub kind: RefKind,
}

/// Maps a field name to the reference it encodes, if any.
/// Pure function of the name; swapping the policy never touches traversal.
pub trait NamingPolicy {
    fn classify(&self, field: &str) -> Option<Reference>;
}

/// The `<base>ID` / `<base>IDs` suffix convention.
///
/// `jobLocationID` targets collection `JobLocation` (base with its first
/// character upper-cased) and embeds under `jobLocation`. `technicianProfileIDs`
/// targets `TechnicianProfile` and embeds under `technicianProfiles`. The
/// primary `_id` field is never a reference.
pub struct SuffixConvention;

impl NamingPolicy for SuffixConvention {
    fn classify(&self, field: &str) -> Option<Reference> {
        if field == "_id" {
            return None;
        }
        if let Some(base) = field.strip_suffix("IDs") {
            if base.is_empty() {
                return None;
            }
            return Some(Reference {
                collection: upper_first(base),
                embed_field: format!("{}s", lower_first(base)),
                kind: RefKind::Multi,
            });
        }
        if let Some(base) = field.strip_suffix("ID") {
            if base.is_empty() {
                return None;
            }
            return Some(Reference {
                collection: upper_first(base),
                embed_field: lower_first(base),
                kind: RefKind::Single,
            });
        }
        None
    }
}

/// Explicit field-name table for schemas where the suffix convention would
/// mis-derive a collection name (irregular pluralization, legacy fields).
#[derive(Debug, Default)]
pub struct RelationMap {
    relations: HashMap<String, Reference>,
}

impl RelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relation: `field` fetches from `collection` and embeds
    /// under `embed_field`.
    pub fn with(mut self, field: &str, collection: &str, embed_field: &str, kind: RefKind) -> Self {
        self.relations.insert(
            field.to_string(),
            Reference {
                collection: collection.to_string(),
                embed_field: embed_field.to_string(),
                kind,
            },
        );
        self
    }
}

impl NamingPolicy for RelationMap {
    fn classify(&self, field: &str) -> Option<Reference> {
        self.relations.get(field).cloned()
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
