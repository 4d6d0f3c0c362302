use admission_core::constants::{DEFAULT_DATA_DIR, DEFAULT_PUBLIC_BASE_URL, DEFAULT_SESSION_COOKIE};
use admission_core::CoreConfig;
use api_rest::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the admission portal
///
/// Resolves the configuration once, opens the local record and file stores under the data
/// directory and serves the REST API.
///
/// # Environment Variables
/// - `ADMISSION_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `ADMISSION_DATA_DIR`: Directory for records and uploads (default: "admission_data")
/// - `ADMISSION_PUBLIC_BASE_URL`: Base of download URLs (default: "http://localhost:3000")
/// - `ADMISSION_SESSION_COOKIE`: Session cookie name (default: "session")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("admission=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("ADMISSION_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("ADMISSION_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let public_base_url = std::env::var("ADMISSION_PUBLIC_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.into());
    let cookie_name = std::env::var("ADMISSION_SESSION_COOKIE")
        .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.into());

    let cfg = Arc::new(CoreConfig::new(
        PathBuf::from(&data_dir),
        public_base_url,
        cookie_name,
    )?);

    tracing::info!("++ Starting admission portal REST on {}", rest_addr);
    tracing::info!("++ Data directory: {}", data_dir);

    let state = AppState::local(cfg)?;
    api_rest::serve(&rest_addr, state).await
}
