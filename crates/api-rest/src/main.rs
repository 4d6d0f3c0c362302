//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `admission-run` binary also loads
//! `.env` and serves the same router.

use admission_core::constants::{DEFAULT_DATA_DIR, DEFAULT_PUBLIC_BASE_URL, DEFAULT_SESSION_COOKIE};
use admission_core::CoreConfig;
use api_rest::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the admission REST API server
///
/// # Environment Variables
/// - `ADMISSION_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `ADMISSION_DATA_DIR`: Directory for records and uploaded files (default: "admission_data")
/// - `ADMISSION_PUBLIC_BASE_URL`: Base of download URLs (default: "http://localhost:3000")
/// - `ADMISSION_SESSION_COOKIE`: Session cookie name (default: "session")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the data directory cannot be prepared, or
/// - the server address cannot be bound or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("admission_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("ADMISSION_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir =
        std::env::var("ADMISSION_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let public_base_url = std::env::var("ADMISSION_PUBLIC_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.into());
    let cookie_name = std::env::var("ADMISSION_SESSION_COOKIE")
        .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.into());

    let cfg = Arc::new(CoreConfig::new(
        PathBuf::from(data_dir),
        public_base_url,
        cookie_name,
    )?);

    tracing::info!("-- Starting admission REST API on {}", addr);
    let state = AppState::local(cfg)?;
    api_rest::serve(&addr, state).await
}
