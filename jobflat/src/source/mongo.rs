use crate::error::Result;
use crate::source::{CollectionSource, RootQuery};
use bson::{doc, Bson, Document};
use mongodb::sync::{Client, Database};
use std::collections::BTreeSet;

/// `CollectionSource` backed by a live MongoDB database, using the driver's
/// synchronous client. One instance per database; read-only.
pub struct MongoSource {
    db: Database,
}

impl MongoSource {
    /// Connect with a connection string and database name. The connection
    /// string carries credentials and must come from the environment.
    pub fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)?;
        Ok(MongoSource {
            db: client.database(database),
        })
    }

    fn created_filter(query: &RootQuery) -> Option<Document> {
        let mut range = Document::new();
        if let Some(after) = query.created_after {
            range.insert("$gte", Bson::DateTime(bson::DateTime::from_chrono(after)));
        }
        if let Some(before) = query.created_before {
            range.insert("$lte", Bson::DateTime(bson::DateTime::from_chrono(before)));
        }
        if range.is_empty() {
            None
        } else {
            Some(doc! { "createdAt": range })
        }
    }
}

impl CollectionSource for MongoSource {
    fn collection_names(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .db
            .list_collection_names()
            .run()?
            .into_iter()
            .collect())
    }

    fn fetch_by_id(&self, collection: &str, id: &Bson) -> Result<Option<Document>> {
        let found = self
            .db
            .collection::<Document>(collection)
            .find_one(doc! { "_id": id.clone() })
            .run()?;
        Ok(found)
    }

    fn fetch_many_by_ids(&self, collection: &str, ids: &[Bson]) -> Result<Vec<Document>> {
        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .run()?;
        let mut docs = Vec::new();
        for item in cursor {
            docs.push(item?);
        }
        Ok(docs)
    }

    fn fetch_roots(&self, collection: &str, query: &RootQuery) -> Result<Vec<Document>> {
        let mut pipeline = Vec::new();
        if let Some(filter) = Self::created_filter(query) {
            pipeline.push(doc! { "$match": filter });
        }
        pipeline.push(doc! { "$limit": query.limit });

        let cursor = self
            .db
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .run()?;
        let mut docs = Vec::new();
        for item in cursor {
            docs.push(item?);
        }
        Ok(docs)
    }
}
