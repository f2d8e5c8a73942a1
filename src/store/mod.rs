//! Store accessor layer.
//!
//! Wraps the two document collections (`listing` and `orders`) behind
//! async traits so the HTTP layer never touches the database driver
//! directly. The production implementations live in [`mongo`]; tests use
//! in-memory implementations of the same traits.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               HTTP layer                │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │  ListingStore   │    │     OrderStore      │
//! │  (trait seam)   │    │    (trait seam)     │
//! └────────┬────────┘    └──────────┬──────────┘
//!          ▼                        ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │MongoListingStore│    │   MongoOrderStore   │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! Documents cross the seam as `serde_json::Value`; identifiers are opaque
//! strings. Not-found is a successful empty result, never an error.

pub mod doc;
pub mod mongo;

pub use mongo::{create_mongo_client, MongoListingStore, MongoOrderStore};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Canonical owner-identity field on listings.
pub const OWNER_FIELD: &str = "created_by";

/// Identity field on orders, matched case-insensitively.
pub const DOWNLOADER_FIELD: &str = "downloaded_by";

/// Download counter field on listings.
pub const DOWNLOADS_FIELD: &str = "downloads";

/// How many listings the latest-listings endpoint returns.
pub const DEFAULT_LATEST_LIMIT: i64 = 6;

/// Accessor for the `listing` collection.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// All listings, store-default order.
    async fn list_all(&self) -> Result<Vec<Value>, StoreError>;

    /// Listings whose `category` matches exactly.
    async fn list_by_category(&self, category: &str) -> Result<Vec<Value>, StoreError>;

    /// Single listing by identifier. `Ok(None)` when nothing matches.
    async fn get_by_id(&self, id: &str) -> Result<Option<Value>, StoreError>;

    /// Insert a new listing, stamping `created_at` if absent.
    /// Returns the store-assigned identifier.
    async fn create(&self, doc: Value) -> Result<String, StoreError>;

    /// Merge the supplied fields into an existing listing.
    /// Returns whether a document was actually modified.
    async fn update(&self, id: &str, patch: Value) -> Result<bool, StoreError>;

    /// Delete by identifier. Returns whether a document was deleted.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;

    /// Listings ordered by `created_at` descending, at most `limit`.
    async fn latest(&self, limit: i64) -> Result<Vec<Value>, StoreError>;

    /// Listings owned by the given identity (`created_by`).
    async fn by_owner(&self, owner: &str) -> Result<Vec<Value>, StoreError>;

    /// Listings whose `name` contains `term` as a case-insensitive
    /// substring. An empty term matches all listings.
    async fn search(&self, term: &str) -> Result<Vec<Value>, StoreError>;

    /// Atomically increment the `downloads` counter by one.
    /// Returns whether a listing matched. Repeated calls double-count.
    async fn increment_downloads(&self, id: &str) -> Result<bool, StoreError>;
}

/// Accessor for the `orders` collection.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order document as submitted, no schema validation.
    /// Returns the store-assigned identifier.
    async fn create(&self, doc: Value) -> Result<String, StoreError>;

    /// Orders whose `downloaded_by` matches case-insensitively.
    async fn by_downloader(&self, email: &str) -> Result<Vec<Value>, StoreError>;

    /// Delete by identifier. Returns whether a document was deleted.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;
}
