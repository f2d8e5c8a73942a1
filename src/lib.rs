//! # pawmart
//!
//! Backend API for a pet adoption and supply marketplace.
//!
//! The service stores `listing` documents (products/pets) and `orders`
//! (download/purchase records) in MongoDB, exposes CRUD and query
//! endpoints over HTTP, and gates a subset of endpoints behind
//! bearer-token identity verification delegated to an external provider.
//!
//! ## Architecture
//!
//! - [`store`] - store accessors over the two document collections,
//!   behind async traits so tests can swap in in-memory implementations
//! - [`server`] - Axum routes, handlers, and bearer-token middleware
//! - [`config`] - CLI and environment configuration
//! - [`error`] - store error taxonomy
//!
//! Requests are independent; the service holds no authoritative state
//! between them. Every request round-trips to the store, and every
//! external call carries a bounded deadline.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pawmart::{
//!     create_mongo_client, create_router, AppState, BearerAuth,
//!     HttpTokenVerifier, MongoListingStore, MongoOrderStore, RouterConfig,
//! };
//!
//! let client = create_mongo_client("mongodb://localhost:27017", timeout).await?;
//! let db = client.database("pet-adoption");
//! let state = AppState::new(
//!     MongoListingStore::new(&db, timeout),
//!     MongoOrderStore::new(&db, timeout),
//! );
//! let verifier = HttpTokenVerifier::new("https://id.example.com/verify", timeout)?;
//! let router = create_router(state, RouterConfig::new(BearerAuth::new(Arc::new(verifier))));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::{AuthLevelArg, Config};
pub use error::StoreError;
pub use server::{
    bearer_token, create_router, ApiError, ApiFailure, ApiSuccess, AppState, AuthError, AuthLevel,
    BearerAuth, HttpTokenVerifier, Identity, OwnerQuery, RouterConfig, SearchQuery, TokenVerifier,
};
pub use store::{
    create_mongo_client, ListingStore, MongoListingStore, MongoOrderStore, OrderStore,
    DEFAULT_LATEST_LIMIT, DOWNLOADER_FIELD, DOWNLOADS_FIELD, OWNER_FIELD,
};
