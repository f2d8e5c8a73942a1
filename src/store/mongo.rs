//! MongoDB-backed store accessors.
//!
//! Implements [`ListingStore`] and [`OrderStore`] against the `listing`
//! and `orders` collections. Every operation is wrapped in a bounded
//! deadline so a silent database never hangs a request.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Cursor, Database};
use serde_json::Value;

use crate::error::StoreError;

use super::doc::{
    document_to_json, json_to_document, parse_object_id, stamp_created_at, CREATED_AT_FIELD,
};
use super::{ListingStore, OrderStore, DOWNLOADER_FIELD, DOWNLOADS_FIELD, OWNER_FIELD};

/// Collection holding marketplace listings.
pub const LISTING_COLLECTION: &str = "listing";

/// Collection holding order records.
pub const ORDERS_COLLECTION: &str = "orders";

/// Create a MongoDB client with bounded connect and server-selection
/// timeouts.
///
/// # Arguments
/// * `uri` - MongoDB connection string
/// * `timeout` - Deadline applied to connection establishment
pub async fn create_mongo_client(uri: &str, timeout: Duration) -> Result<Client, StoreError> {
    let mut options = ClientOptions::parse(uri).await?;
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);
    Client::with_options(options).map_err(StoreError::from)
}

/// Ping the server so startup fails fast when the store is unreachable.
pub async fn ping(database: &Database) -> Result<(), StoreError> {
    database.run_command(doc! {"ping": 1}).await?;
    Ok(())
}

// =============================================================================
// Filters
// =============================================================================

/// Filter for the name search. `None` means "match everything".
fn search_filter(term: &str) -> Option<Document> {
    if term.is_empty() {
        return None;
    }
    Some(doc! {
        "name": {"$regex": regex::escape(term), "$options": "i"}
    })
}

/// Case-insensitive exact match on the downloader identity.
fn downloader_filter(email: &str) -> Document {
    doc! {
        DOWNLOADER_FIELD: {
            "$regex": format!("^{}$", regex::escape(email)),
            "$options": "i",
        }
    }
}

// =============================================================================
// Shared plumbing
// =============================================================================

async fn bounded<T, F>(deadline: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(deadline.as_secs())),
    }
}

async fn collect_json(cursor: Cursor<Document>) -> Result<Vec<Value>, StoreError> {
    let documents: Vec<Document> = cursor.try_collect().await.map_err(StoreError::from)?;
    Ok(documents.into_iter().map(document_to_json).collect())
}

fn inserted_id_to_string(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        // Clients may supply their own _id; pass it through as-is.
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

// =============================================================================
// Listing store
// =============================================================================

/// MongoDB implementation of [`ListingStore`].
#[derive(Clone)]
pub struct MongoListingStore {
    collection: Collection<Document>,
    op_timeout: Duration,
}

impl MongoListingStore {
    /// Create a listing store over the given database.
    pub fn new(database: &Database, op_timeout: Duration) -> Self {
        Self {
            collection: database.collection(LISTING_COLLECTION),
            op_timeout,
        }
    }
}

#[async_trait]
impl ListingStore for MongoListingStore {
    async fn list_all(&self) -> Result<Vec<Value>, StoreError> {
        bounded(self.op_timeout, async {
            let cursor = self.collection.find(doc! {}).await?;
            collect_json(cursor).await
        })
        .await
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Value>, StoreError> {
        bounded(self.op_timeout, async {
            let cursor = self.collection.find(doc! {"category": category}).await?;
            collect_json(cursor).await
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let oid = parse_object_id(id)?;
        bounded(self.op_timeout, async {
            let found = self.collection.find_one(doc! {"_id": oid}).await?;
            Ok(found.map(document_to_json))
        })
        .await
    }

    async fn create(&self, doc: Value) -> Result<String, StoreError> {
        let mut document = json_to_document(&doc)?;
        stamp_created_at(&mut document);
        bounded(self.op_timeout, async {
            let result = self.collection.insert_one(document).await?;
            Ok(inserted_id_to_string(result.inserted_id))
        })
        .await
    }

    async fn update(&self, id: &str, patch: Value) -> Result<bool, StoreError> {
        let oid = parse_object_id(id)?;
        let patch = json_to_document(&patch)?;
        bounded(self.op_timeout, async {
            let result = self
                .collection
                .update_one(doc! {"_id": oid}, doc! {"$set": patch})
                .await?;
            Ok(result.modified_count > 0)
        })
        .await
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let oid = parse_object_id(id)?;
        bounded(self.op_timeout, async {
            let result = self.collection.delete_one(doc! {"_id": oid}).await?;
            Ok(result.deleted_count > 0)
        })
        .await
    }

    async fn latest(&self, limit: i64) -> Result<Vec<Value>, StoreError> {
        bounded(self.op_timeout, async {
            let cursor = self
                .collection
                .find(doc! {})
                .sort(doc! {CREATED_AT_FIELD: -1})
                .limit(limit)
                .await?;
            collect_json(cursor).await
        })
        .await
    }

    async fn by_owner(&self, owner: &str) -> Result<Vec<Value>, StoreError> {
        bounded(self.op_timeout, async {
            let cursor = self.collection.find(doc! {OWNER_FIELD: owner}).await?;
            collect_json(cursor).await
        })
        .await
    }

    async fn search(&self, term: &str) -> Result<Vec<Value>, StoreError> {
        let filter = search_filter(term).unwrap_or_default();
        bounded(self.op_timeout, async {
            let cursor = self.collection.find(filter).await?;
            collect_json(cursor).await
        })
        .await
    }

    async fn increment_downloads(&self, id: &str) -> Result<bool, StoreError> {
        let oid = parse_object_id(id)?;
        bounded(self.op_timeout, async {
            let result = self
                .collection
                .update_one(doc! {"_id": oid}, doc! {"$inc": {DOWNLOADS_FIELD: 1}})
                .await?;
            Ok(result.matched_count > 0)
        })
        .await
    }
}

// =============================================================================
// Order store
// =============================================================================

/// MongoDB implementation of [`OrderStore`].
#[derive(Clone)]
pub struct MongoOrderStore {
    collection: Collection<Document>,
    op_timeout: Duration,
}

impl MongoOrderStore {
    /// Create an order store over the given database.
    pub fn new(database: &Database, op_timeout: Duration) -> Self {
        Self {
            collection: database.collection(ORDERS_COLLECTION),
            op_timeout,
        }
    }
}

#[async_trait]
impl OrderStore for MongoOrderStore {
    async fn create(&self, doc: Value) -> Result<String, StoreError> {
        let document = json_to_document(&doc)?;
        bounded(self.op_timeout, async {
            let result = self.collection.insert_one(document).await?;
            Ok(inserted_id_to_string(result.inserted_id))
        })
        .await
    }

    async fn by_downloader(&self, email: &str) -> Result<Vec<Value>, StoreError> {
        bounded(self.op_timeout, async {
            let cursor = self.collection.find(downloader_filter(email)).await?;
            collect_json(cursor).await
        })
        .await
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let oid = parse_object_id(id)?;
        bounded(self.op_timeout, async {
            let result = self.collection.delete_one(doc! {"_id": oid}).await?;
            Ok(result.deleted_count > 0)
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================
