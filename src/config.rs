//! Configuration management for pawmart.
//!
//! Supports command-line arguments via clap, environment variables with
//! the `PAWMART_` prefix, and sensible defaults for all optional settings.
//!
//! # Environment Variables
//!
//! - `PAWMART_HOST` - Server bind address (default: 0.0.0.0)
//! - `PAWMART_PORT` - Server port (default: 3000)
//! - `PAWMART_MONGO_URI` - MongoDB connection string (required)
//! - `PAWMART_MONGO_DB` - Database name (default: pet-adoption)
//! - `PAWMART_AUTH_ENABLED` - Enable bearer-token auth (default: true)
//! - `PAWMART_AUTH_VERIFY_URL` - Identity provider verification endpoint
//! - `PAWMART_LISTING_DETAIL_AUTH` - Policy for GET /listing/{id}
//! - `PAWMART_EXTERNAL_TIMEOUT` - Deadline in seconds for store and
//!   verifier calls (default: 10)
//! - `PAWMART_CORS_ORIGINS` - Comma-separated allowed origins

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::server::AuthLevel;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default database name.
pub const DEFAULT_DATABASE: &str = "pet-adoption";

/// Default deadline for external calls in seconds.
pub const DEFAULT_EXTERNAL_TIMEOUT: u64 = 10;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Auth policy choice for the listing detail endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthLevelArg {
    /// No verification
    None,
    /// Verify a token when present, proceed anonymously otherwise
    Optional,
    /// Reject requests without a valid token
    Required,
}

impl From<AuthLevelArg> for AuthLevel {
    fn from(arg: AuthLevelArg) -> Self {
        match arg {
            AuthLevelArg::None => AuthLevel::None,
            AuthLevelArg::Optional => AuthLevel::Optional,
            AuthLevelArg::Required => AuthLevel::Required,
        }
    }
}

/// pawmart - backend API for a pet adoption and supply marketplace.
///
/// Stores listings and orders in MongoDB and gates a subset of endpoints
/// behind bearer-token verification by an external identity provider.
#[derive(Parser, Debug, Clone)]
#[command(name = "pawmart")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "PAWMART_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PAWMART_PORT")]
    pub port: u16,

    // =========================================================================
    // Store Configuration
    // =========================================================================
    /// MongoDB connection string.
    #[arg(long, env = "PAWMART_MONGO_URI")]
    pub mongo_uri: String,

    /// Database holding the listing and orders collections.
    #[arg(long, default_value = DEFAULT_DATABASE, env = "PAWMART_MONGO_DB")]
    pub mongo_db: String,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Enable bearer-token authentication.
    ///
    /// When disabled, every endpoint is publicly accessible.
    /// WARNING: Only disable authentication in development/testing.
    #[arg(
        long,
        default_value_t = true,
        env = "PAWMART_AUTH_ENABLED",
        action = clap::ArgAction::Set
    )]
    pub auth_enabled: bool,

    /// Verification endpoint of the external identity provider.
    ///
    /// If not provided and auth is enabled, the server will fail to start.
    #[arg(long, env = "PAWMART_AUTH_VERIFY_URL")]
    pub auth_verify_url: Option<String>,

    /// Auth policy for GET /listing/{id}.
    ///
    /// Deployments disagree on whether listing details are public, so this
    /// is a configuration decision rather than a hard-coded one.
    #[arg(
        long,
        value_enum,
        default_value_t = AuthLevelArg::Required,
        env = "PAWMART_LISTING_DETAIL_AUTH"
    )]
    pub listing_detail_auth: AuthLevelArg,

    // =========================================================================
    // External Call Configuration
    // =========================================================================
    /// Deadline in seconds for store and identity-provider calls.
    #[arg(long, default_value_t = DEFAULT_EXTERNAL_TIMEOUT, env = "PAWMART_EXTERNAL_TIMEOUT")]
    pub external_timeout: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "PAWMART_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.mongo_uri.is_empty() {
            return Err(
                "MongoDB connection string is required. Set --mongo-uri or PAWMART_MONGO_URI"
                    .to_string(),
            );
        }

        if self.auth_enabled {
            match self.auth_verify_url.as_deref() {
                None | Some("") => {
                    return Err(
                        "Authentication is enabled but no verification endpoint provided. \
                         Set --auth-verify-url or PAWMART_AUTH_VERIFY_URL, or disable auth \
                         with --auth-enabled=false"
                            .to_string(),
                    );
                }
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    return Err(format!(
                        "auth_verify_url must be an http(s) URL, got '{}'",
                        url
                    ));
                }
                Some(_) => {}
            }
        }

        if self.external_timeout == 0 {
            return Err("external_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Deadline applied to store and identity-provider calls.
    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout)
    }
}

// =============================================================================
// Tests
// =============================================================================
