//! pawmart - backend API for a pet adoption and supply marketplace.
//!
//! This binary starts the HTTP server and wires up all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pawmart::{
    config::Config,
    server::{create_router, AppState, AuthError, BearerAuth, HttpTokenVerifier, RouterConfig},
    store::{create_mongo_client, mongo, MongoListingStore, MongoOrderStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("pawmart v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Database: {}", config.mongo_db);
    if config.auth_enabled {
        info!("  Auth: enabled");
    } else {
        warn!("  Auth: DISABLED - all endpoints are publicly accessible");
        warn!("        Enable for production: --auth-verify-url=<url>");
    }
    info!("  External call deadline: {}s", config.external_timeout);

    // Connect to MongoDB and fail fast when the store is unreachable
    info!("Connecting to MongoDB...");
    let client = match create_mongo_client(&config.mongo_uri, config.external_timeout()).await {
        Ok(client) => client,
        Err(e) => {
            error!("  Invalid MongoDB configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let database = client.database(&config.mongo_db);
    if let Err(e) = mongo::ping(&database).await {
        error!("  Failed to reach MongoDB: {}", e);
        error!("");
        error!("  Please check:");
        error!("    - The connection string is correct");
        error!("    - The server is running and reachable");
        error!("    - Your credentials allow access to '{}'", config.mongo_db);
        return ExitCode::FAILURE;
    }
    info!("  Connected successfully");

    // Build the store accessors and application state
    let state = AppState::new(
        MongoListingStore::new(&database, config.external_timeout()),
        MongoOrderStore::new(&database, config.external_timeout()),
    );

    // Build the router configuration
    let router_config = match build_router_config(&config) {
        Ok(router_config) => router_config,
        Err(e) => {
            error!("Failed to build the identity provider client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let router = create_router(state, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/", addr);
    info!("    curl http://{}/listing", addr);
    info!("    curl http://{}/latest-list", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "pawmart=debug,tower_http=debug"
    } else {
        "pawmart=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
///
/// Fails when the identity provider client cannot be constructed.
fn build_router_config(config: &Config) -> Result<RouterConfig, AuthError> {
    let mut router_config = if config.auth_enabled {
        // validate() guarantees the URL is present when auth is enabled
        let endpoint = config.auth_verify_url.clone().unwrap_or_default();
        let verifier = HttpTokenVerifier::new(endpoint, config.external_timeout())?;
        RouterConfig::new(BearerAuth::new(Arc::new(verifier)))
            .with_listing_detail_auth(config.listing_detail_auth.into())
    } else {
        RouterConfig::without_auth()
    };

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    Ok(router_config.with_tracing(!config.no_tracing))
}
