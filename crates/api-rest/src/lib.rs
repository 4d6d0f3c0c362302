//! # API REST
//!
//! REST API implementation for the admission portal.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, session cookies, CORS)
//!
//! Uses `api-shared` for common types and utilities. Domain behaviour lives in
//! `admission-core`; handlers only translate between HTTP and core calls.

#![warn(rust_2018_idioms)]

mod error;
mod handlers;
mod session;

pub use error::{ApiError, ApiResult};
pub use session::{session_token, CurrentSession};

use admission_core::backend::{
    AuthService, DocumentStore, LocalAuthService, LocalBlobStore, LocalDocumentStore,
};
use admission_core::examination::ExaminationService;
use admission_core::{AdmissionResult, AuthBoundary, CoreConfig, SubmissionPipeline};
use admission_files::BlobStorageService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers. Every service
/// shares the same document store, so a write made through one is visible to the others.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    auth: AuthBoundary,
    pipeline: SubmissionPipeline,
    exams: ExaminationService,
    store: Arc<dyn DocumentStore>,
    files: BlobStorageService,
}

impl AppState {
    pub fn new(
        cfg: Arc<CoreConfig>,
        auth: Arc<dyn AuthService>,
        store: Arc<dyn DocumentStore>,
        blobs: LocalBlobStore,
    ) -> Self {
        let files = blobs.files().clone();
        let blobs = Arc::new(blobs);
        Self {
            auth: AuthBoundary::new(auth, store.clone()),
            pipeline: SubmissionPipeline::new(store.clone(), blobs.clone()),
            exams: ExaminationService::new(store.clone(), blobs),
            store,
            files,
            cfg,
        }
    }

    /// State backed by the local stores under the configured data directory.
    ///
    /// Records and accounts are reloaded from disk; session tokens live in memory for the
    /// life of the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directories cannot be created or a store fails to open.
    pub fn local(cfg: Arc<CoreConfig>) -> AdmissionResult<Self> {
        cfg.ensure_data_dirs()?;
        let store: Arc<dyn DocumentStore> =
            Arc::new(LocalDocumentStore::open(cfg.records_dir())?);
        let files = BlobStorageService::new(&cfg.files_dir())?;
        let blobs = LocalBlobStore::new(files, cfg.public_base_url());
        let auth = Arc::new(LocalAuthService::with_store(store.clone()));
        Ok(Self::new(cfg, auth, store, blobs))
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::register,
        handlers::sign_in,
        handlers::login,
        handlers::logout,
        handlers::list_steps,
        handlers::validate_step,
        handlers::visibility,
        handlers::submit_admission,
        handlers::my_admission,
        handlers::upload_proof,
        handlers::upload_receipt,
        handlers::mark_complete,
        handlers::serve_file,
    ),
    components(schemas(
        api_shared::HealthRes,
        handlers::NotificationRes,
        handlers::RegisterRes,
        handlers::SignInReq,
        handlers::SignInRes,
        handlers::LoginRes,
        handlers::LogoutRes,
        handlers::StepRes,
        handlers::StepCheckRes,
        handlers::SubmitRes,
        handlers::UploadRes,
        handlers::CompleteRes,
    ))
)]
struct ApiDoc;

/// Builds the router with every endpoint, Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/register", post(handlers::register))
        .route("/api/sign-in", post(handlers::sign_in))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", get(handlers::logout))
        .route("/api/form/steps", get(handlers::list_steps))
        .route("/api/form/steps/:index/validate", post(handlers::validate_step))
        .route("/api/form/visibility", post(handlers::visibility))
        .route("/api/admissions", post(handlers::submit_admission))
        .route("/api/admissions/me", get(handlers::my_admission))
        .route(
            "/api/admissions/me/examination/proof",
            post(handlers::upload_proof),
        )
        .route(
            "/api/admissions/me/examination/receipt",
            post(handlers::upload_receipt),
        )
        .route(
            "/api/admissions/me/examination/complete",
            post(handlers::mark_complete),
        )
        .route("/files/*path", get(handlers::serve_file))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the router until the server stops.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- Admission REST API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
