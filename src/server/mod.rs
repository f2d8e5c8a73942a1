//! HTTP server layer for pawmart.
//!
//! Translates requests into store operations and store results into the
//! uniform response envelope.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │      GET/POST/PUT/DELETE on /listing, /orders, /search ...      │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    auth     │  │        routes           │  │
//! │  │ (requests)  │  │  (bearer)   │  │  (policy + router)      │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{
    bearer_token, optional_auth, require_auth, AuthError, BearerAuth, HttpTokenVerifier, Identity,
    TokenVerifier,
};
pub use handlers::{
    liveness_handler, ApiError, ApiFailure, ApiSuccess, AppState, OwnerQuery, SearchQuery,
};
pub use routes::{create_router, AuthLevel, RouterConfig};
