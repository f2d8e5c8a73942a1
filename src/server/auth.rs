//! Bearer-token authentication for pawmart.
//!
//! Token issuance and validation belong to an external identity provider;
//! this module only extracts the `Authorization: Bearer <token>` header and
//! delegates the check through the [`TokenVerifier`] trait. Each request is
//! re-verified; verification results are never cached.
//!
//! Two middlewares implement the per-route policy levels:
//!
//! - [`require_auth`] - missing or invalid token rejects with 401 and the
//!   handler never runs;
//! - [`optional_auth`] - a missing token proceeds anonymously, a present
//!   but invalid token still rejects.
//!
//! On success the verified [`Identity`] is stored in the request extensions
//! so handlers can fall back to it when no identity query parameter is
//! given.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::handlers::ApiFailure;

// =============================================================================
// Types
// =============================================================================

/// A verified identity returned by the external provider.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Provider-assigned subject identifier
    pub subject: String,

    /// Email associated with the token, when the provider knows one
    pub email: Option<String>,
}

/// Authentication error types.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No bearer token in the Authorization header
    #[error("Unauthorized: token not found")]
    MissingToken,

    /// The provider rejected the token (expired, malformed, bad signature)
    #[error("Unauthorized: invalid token ({0})")]
    InvalidToken(String),

    /// The provider could not be reached
    #[error("Identity provider unavailable: {0}")]
    VerifierUnavailable(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingToken | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::VerifierUnavailable(_) => StatusCode::BAD_GATEWAY,
        };

        let message = self.to_string();

        // A rejected token could indicate probing, a missing one is routine.
        match &self {
            AuthError::MissingToken => {
                debug!(status = status.as_u16(), "Authentication failed: {}", message);
            }
            _ => {
                warn!(status = status.as_u16(), "Authentication failed: {}", message);
            }
        }

        (status, Json(ApiFailure::new(message))).into_response()
    }
}

// =============================================================================
// Token verification
// =============================================================================

/// Contract with the external identity provider:
/// `verify(token) -> Identity | failure`.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Validate a bearer token and return the identity it belongs to.
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Response body of the provider's verification endpoint.
#[derive(Debug, Deserialize)]
struct VerifiedToken {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Token verifier that POSTs to the identity provider over HTTPS.
///
/// The endpoint receives `{"token": "<token>"}` and answers 200 with
/// `{"sub": "...", "email": "..."}` for valid tokens. Any 4xx means the
/// token was rejected; transport failures and 5xx map to
/// [`AuthError::VerifierUnavailable`].
#[derive(Clone)]
pub struct HttpTokenVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTokenVerifier {
    /// Create a verifier for the given verification endpoint.
    ///
    /// Fails when the HTTP client cannot be constructed (e.g. the TLS
    /// backend does not initialize). The timeout is part of the client;
    /// a verifier without it must never exist.
    ///
    /// # Arguments
    /// * `endpoint` - Full URL of the provider's verify endpoint
    /// * `timeout` - Deadline for each verification call
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::VerifierUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({"token": token}))
            .send()
            .await
            .map_err(|e| AuthError::VerifierUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AuthError::InvalidToken(format!(
                "provider answered {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(AuthError::VerifierUnavailable(format!(
                "provider answered {}",
                status.as_u16()
            )));
        }

        let verified: VerifiedToken = response
            .json()
            .await
            .map_err(|e| AuthError::VerifierUnavailable(e.to_string()))?;

        Ok(Identity {
            subject: verified.sub,
            email: verified.email,
        })
    }
}

// =============================================================================
// Bearer extraction
// =============================================================================

/// Extract the bearer token from an Authorization header, if present.
///
/// The scheme is matched case-insensitively; a header with a different
/// scheme counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Middleware state: the verifier shared by all protected routes.
#[derive(Clone)]
pub struct BearerAuth {
    verifier: Arc<dyn TokenVerifier>,
}

impl BearerAuth {
    /// Wrap a verifier for use as middleware state.
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Extract and verify the bearer token from the request headers.
    pub async fn verify_request(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        self.verifier.verify(token).await
    }
}

/// Reject the request unless it carries a valid bearer token.
pub async fn require_auth(
    State(auth): State<BearerAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = auth.verify_request(request.headers()).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Proceed anonymously when no token is present; a present but invalid
/// token is still rejected.
pub async fn optional_auth(
    State(auth): State<BearerAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if bearer_token(request.headers()).is_some() {
        let identity = auth.verify_request(request.headers()).await?;
        request.extensions_mut().insert(identity);
    }
    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
