//! HTTP request handlers for the pawmart marketplace API.
//!
//! Every handler is a single-step translation of a request into one or two
//! store operations. Responses use one uniform envelope:
//!
//! - success: `{"success": true, "result": <value>}`
//! - failure: `{"success": false, "message": "<text>"}`
//!
//! A lookup that matches nothing is a SUCCESS with a `null` result, never
//! an error; callers check the payload, not the status code.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::store::{ListingStore, OrderStore, DEFAULT_LATEST_LIMIT};

use super::auth::{AuthError, Identity};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state holding the two store accessors.
///
/// Passed to all handlers via Axum's State extractor.
pub struct AppState<L: ListingStore, O: OrderStore> {
    /// Accessor for the listing collection
    pub listings: Arc<L>,

    /// Accessor for the orders collection
    pub orders: Arc<O>,
}

impl<L: ListingStore, O: OrderStore> AppState<L, O> {
    /// Create a new application state from the two store accessors.
    pub fn new(listings: L, orders: O) -> Self {
        Self {
            listings: Arc::new(listings),
            orders: Arc::new(orders),
        }
    }
}

impl<L: ListingStore, O: OrderStore> Clone for AppState<L, O> {
    fn clone(&self) -> Self {
        Self {
            listings: Arc::clone(&self.listings),
            orders: Arc::clone(&self.orders),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Name substring to match, case-insensitively. Absent matches all.
    #[serde(default)]
    pub search: Option<String>,
}

/// Query parameters for the "my data" endpoints.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    /// Identity email. Falls back to the verified token identity when absent.
    #[serde(default)]
    pub email: Option<String>,
}

// =============================================================================
// Response Envelope
// =============================================================================

/// Uniform success envelope.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    /// Always `true`
    pub success: bool,

    /// Operation result; `null` for a not-found lookup
    pub result: T,
}

impl<T: Serialize> ApiSuccess<T> {
    /// Wrap a result value.
    pub fn new(result: T) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

/// Uniform failure envelope.
#[derive(Debug, Serialize)]
pub struct ApiFailure {
    /// Always `false`
    pub success: bool,

    /// Human-readable failure message
    pub message: String,
}

impl ApiFailure {
    /// Create a failure envelope with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert StoreError to an HTTP response with the failure envelope.
///
/// 4xx causes are logged at warn, 5xx at error.
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::InvalidId(_) | StoreError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
            StoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Store error: {}", message);
        } else {
            warn!(status = status.as_u16(), "Client error: {}", message);
        }

        (status, Json(ApiFailure::new(message))).into_response()
    }
}

/// Unified handler error so `?` works across the store and auth layers.
#[derive(Debug)]
pub enum ApiError {
    /// A store accessor failed
    Store(StoreError),

    /// Authentication failed inside a handler
    Auth(AuthError),

    /// The request itself is malformed (e.g. missing required parameter)
    BadRequest(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(err) => err.into_response(),
            ApiError::Auth(err) => err.into_response(),
            ApiError::BadRequest(message) => {
                debug!(status = 400_u16, "Bad request: {}", message);
                (StatusCode::BAD_REQUEST, Json(ApiFailure::new(message))).into_response()
            }
        }
    }
}

/// Pick the identity email for the "my data" endpoints: explicit query
/// parameter first, then the verified token identity.
fn resolve_email(query: Option<String>, identity: Option<&Identity>) -> Result<String, ApiError> {
    query
        .filter(|email| !email.is_empty())
        .or_else(|| identity.and_then(|id| id.email.clone()))
        .ok_or_else(|| ApiError::BadRequest("email query parameter is required".to_string()))
}

// =============================================================================
// Liveness
// =============================================================================

/// Handle liveness checks.
///
/// # Endpoint
///
/// `GET /`
pub async fn liveness_handler() -> &'static str {
    "Server is running fine!"
}

// =============================================================================
// Listing Handlers
// =============================================================================

/// List all listings.
///
/// # Endpoint
///
/// `GET /listing`
pub async fn list_listings<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
) -> Result<Json<ApiSuccess<Vec<Value>>>, StoreError> {
    let result = state.listings.list_all().await?;
    Ok(Json(ApiSuccess::new(result)))
}

/// List listings in one category (exact match).
///
/// # Endpoint
///
/// `GET /category/{category}`
pub async fn listings_by_category<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Path(category): Path<String>,
) -> Result<Json<ApiSuccess<Vec<Value>>>, StoreError> {
    let result = state.listings.list_by_category(&category).await?;
    Ok(Json(ApiSuccess::new(result)))
}

/// Fetch one listing by id.
///
/// # Endpoint
///
/// `GET /listing/{id}`
///
/// # Response
///
/// `200 OK` with `result: null` when no listing matches - not-found is not
/// an error.
pub async fn get_listing<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccess<Option<Value>>>, StoreError> {
    let result = state.listings.get_by_id(&id).await?;
    Ok(Json(ApiSuccess::new(result)))
}

/// Create a listing from the request body. `created_at` is stamped by the
/// store if the client did not supply one.
///
/// # Endpoint
///
/// `POST /listing`
///
/// # Response
///
/// `200 OK` with `result: {"id": "<assigned id>"}`.
pub async fn create_listing<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Json(body): Json<Value>,
) -> Result<Json<ApiSuccess<Value>>, StoreError> {
    let id = state.listings.create(body).await?;
    Ok(Json(ApiSuccess::new(json!({"id": id}))))
}

/// Merge the request body into an existing listing.
///
/// # Endpoint
///
/// `PUT /listing/{id}`
///
/// # Response
///
/// `200 OK` with `result: {"modified": <bool>}`. Updating a missing id
/// yields `modified: false`, not an error.
pub async fn update_listing<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ApiSuccess<Value>>, StoreError> {
    let modified = state.listings.update(&id, body).await?;
    Ok(Json(ApiSuccess::new(json!({"modified": modified}))))
}

/// Delete a listing. Orders referencing it are left in place (no cascade).
///
/// # Endpoint
///
/// `DELETE /listing/{id}`
pub async fn delete_listing<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccess<Value>>, StoreError> {
    let deleted = state.listings.remove(&id).await?;
    Ok(Json(ApiSuccess::new(json!({"deleted": deleted}))))
}

/// The most recent listings by `created_at`, at most six.
///
/// # Endpoint
///
/// `GET /latest-list`
pub async fn latest_listings<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
) -> Result<Json<ApiSuccess<Vec<Value>>>, StoreError> {
    let result = state.listings.latest(DEFAULT_LATEST_LIMIT).await?;
    Ok(Json(ApiSuccess::new(result)))
}

/// Listings owned by the requesting user.
///
/// # Endpoint
///
/// `GET /my-models?email=<owner>`
///
/// The `email` query parameter wins; without it the email from the
/// verified token identity is used.
pub async fn my_listings<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Query(query): Query<OwnerQuery>,
    identity: Option<Extension<Identity>>,
) -> Result<Json<ApiSuccess<Vec<Value>>>, ApiError> {
    let email = resolve_email(query.email, identity.as_deref())?;
    let result = state.listings.by_owner(&email).await?;
    Ok(Json(ApiSuccess::new(result)))
}

/// Search listings by name substring, case-insensitively.
///
/// # Endpoint
///
/// `GET /search?search=<term>`
///
/// An absent or empty term matches all listings.
pub async fn search_listings<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiSuccess<Vec<Value>>>, StoreError> {
    let term = query.search.unwrap_or_default();
    let result = state.listings.search(&term).await?;
    Ok(Json(ApiSuccess::new(result)))
}

// =============================================================================
// Order Handlers
// =============================================================================

/// Place an order for a listing and count the download, all-or-nothing.
///
/// # Endpoint
///
/// `POST /orders/{id}`
///
/// Inserts the order, then increments the listing's `downloads` counter.
/// If the increment fails the inserted order is deleted again so that no
/// order exists without its counter update.
///
/// # Response
///
/// `200 OK` with `result: {"order_id": "...", "download_counted": <bool>}`.
/// `download_counted` is `false` when no listing matched the id.
pub async fn place_order<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ApiSuccess<Value>>, StoreError> {
    let order_id = state.orders.create(body).await?;

    match state.listings.increment_downloads(&id).await {
        Ok(counted) => Ok(Json(ApiSuccess::new(json!({
            "order_id": order_id,
            "download_counted": counted,
        })))),
        Err(err) => {
            warn!(
                listing_id = %id,
                order_id = %order_id,
                "Download count failed, rolling back order: {}",
                err
            );
            if let Err(cleanup) = state.orders.remove(&order_id).await {
                error!(
                    order_id = %order_id,
                    "Failed to roll back order after count failure: {}",
                    cleanup
                );
            }
            Err(err)
        }
    }
}

/// Delete an order.
///
/// # Endpoint
///
/// `DELETE /orders/{id}`
pub async fn delete_order<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccess<Value>>, StoreError> {
    let deleted = state.orders.remove(&id).await?;
    Ok(Json(ApiSuccess::new(json!({"deleted": deleted}))))
}

/// Orders placed by the requesting user, matched case-insensitively on
/// `downloaded_by`.
///
/// # Endpoint
///
/// `GET /my-downloads?email=<downloader>`
pub async fn my_downloads<L: ListingStore, O: OrderStore>(
    State(state): State<AppState<L, O>>,
    Query(query): Query<OwnerQuery>,
    identity: Option<Extension<Identity>>,
) -> Result<Json<ApiSuccess<Vec<Value>>>, ApiError> {
    let email = resolve_email(query.email, identity.as_deref())?;
    let result = state.orders.by_downloader(&email).await?;
    Ok(Json(ApiSuccess::new(result)))
}

// =============================================================================
// Tests
// =============================================================================
