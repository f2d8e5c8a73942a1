//! Router configuration for the pawmart API.
//!
//! Authorization policy is declared in exactly one place: the route table
//! in [`create_router`], which attaches per-route middleware from an
//! [`AuthLevel`] instead of embedding ad hoc checks inside handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                       - liveness (public)
//! GET    /listing                - all listings (public)
//! POST   /listing                - create listing (public)
//! GET    /listing/{id}           - one listing (configurable)
//! PUT    /listing/{id}           - update listing (required)
//! DELETE /listing/{id}           - delete listing (required)
//! GET    /category/{category}    - listings by category (public)
//! GET    /latest-list            - latest six listings (public)
//! GET    /my-models              - own listings (required)
//! POST   /orders/{id}            - place order (public)
//! DELETE /orders/{id}            - delete order (required)
//! GET    /my-downloads           - own orders (required)
//! GET    /search                 - name search (public)
//! ```

use std::time::Duration;

use axum::{
    middleware,
    routing::{delete, get, put, MethodRouter},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::store::{ListingStore, OrderStore};

use super::auth::{optional_auth, require_auth, BearerAuth};
use super::handlers::{
    create_listing, delete_listing, delete_order, get_listing, latest_listings, list_listings,
    listings_by_category, liveness_handler, my_downloads, my_listings, place_order,
    search_listings, update_listing, AppState,
};

// =============================================================================
// Auth Policy
// =============================================================================

/// Authorization level required by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthLevel {
    /// No verification at all
    None,

    /// Verify a token when one is present, otherwise proceed anonymously
    Optional,

    /// Reject requests without a valid token
    Required,
}

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Bearer-token verification state; `None` disables auth everywhere
    pub auth: Option<BearerAuth>,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Policy for `GET /listing/{id}` - a configuration decision, since
    /// deployments disagree on whether listing details are public
    pub listing_detail_auth: AuthLevel,
}

impl RouterConfig {
    /// Create a router configuration with authentication enabled.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - Listing detail requires a verified token
    pub fn new(auth: BearerAuth) -> Self {
        Self {
            auth: Some(auth),
            cors_origins: None,
            enable_tracing: true,
            listing_detail_auth: AuthLevel::Required,
        }
    }

    /// Create a configuration with authentication disabled.
    ///
    /// **Warning**: This should only be used for development/testing.
    pub fn without_auth() -> Self {
        Self {
            auth: None,
            cors_origins: None,
            enable_tracing: true,
            listing_detail_auth: AuthLevel::None,
        }
    }

    /// Set specific allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Set the auth policy for `GET /listing/{id}`.
    pub fn with_listing_detail_auth(mut self, level: AuthLevel) -> Self {
        self.listing_detail_auth = level;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Builds the complete Axum router with the auth policy per route, CORS
/// configuration, and optional request tracing.
pub fn create_router<L, O>(state: AppState<L, O>, config: RouterConfig) -> Router
where
    L: ListingStore + 'static,
    O: OrderStore + 'static,
{
    let auth = config.auth.as_ref();

    // The declarative route -> auth-level table. Paths with mixed policies
    // get per-method middleware merged into one MethodRouter.
    let router = Router::new()
        .route("/", get(liveness_handler))
        .route(
            "/listing",
            get(list_listings::<L, O>).post(create_listing::<L, O>),
        )
        .route(
            "/listing/{id}",
            protect(get(get_listing::<L, O>), config.listing_detail_auth, auth)
                .merge(protect(
                    put(update_listing::<L, O>),
                    AuthLevel::Required,
                    auth,
                ))
                .merge(protect(
                    delete(delete_listing::<L, O>),
                    AuthLevel::Required,
                    auth,
                )),
        )
        .route(
            "/category/{category}",
            get(listings_by_category::<L, O>),
        )
        .route("/latest-list", get(latest_listings::<L, O>))
        .route(
            "/my-models",
            protect(get(my_listings::<L, O>), AuthLevel::Required, auth),
        )
        .route(
            "/orders/{id}",
            axum::routing::post(place_order::<L, O>).merge(protect(
                delete(delete_order::<L, O>),
                AuthLevel::Required,
                auth,
            )),
        )
        .route(
            "/my-downloads",
            protect(get(my_downloads::<L, O>), AuthLevel::Required, auth),
        )
        .route("/search", get(search_listings::<L, O>))
        .with_state(state)
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Attach the middleware matching an auth level to one method router.
///
/// With auth globally disabled every route is public.
fn protect<L, O>(
    routes: MethodRouter<AppState<L, O>>,
    level: AuthLevel,
    auth: Option<&BearerAuth>,
) -> MethodRouter<AppState<L, O>>
where
    L: ListingStore + 'static,
    O: OrderStore + 'static,
{
    let Some(auth) = auth else {
        return routes;
    };
    match level {
        AuthLevel::None => routes,
        AuthLevel::Optional => {
            routes.route_layer(middleware::from_fn_with_state(auth.clone(), optional_auth))
        }
        AuthLevel::Required => {
            routes.route_layer(middleware::from_fn_with_state(auth.clone(), require_auth))
        }
    }
}

/// Build the CORS layer based on configuration.
///
/// Per the public API contract: methods GET/POST/PUT/DELETE/OPTIONS with
/// the `Content-Type` and `Authorization` headers.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
