//! # API Shared
//!
//! Shared utilities and definitions for the admission portal APIs.
//!
//! Contains:
//! - Shared services like `HealthService`
//! - Session transport helpers (bearer tokens and session cookies)
//!
//! Used by `api-rest`; kept free of HTTP framework types so other front ends can reuse it.

pub mod auth;
pub mod health;

pub use auth::{clear_session_cookie, parse_bearer, read_cookie, session_cookie, AuthHeaderError};
pub use health::{HealthRes, HealthService};
