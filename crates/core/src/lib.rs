//! # Admission Core
//!
//! Core logic for the school admission portal:
//! - form schema, declarative validation and conditional visibility
//! - multi-step navigation over the admission form
//! - the submission pipeline (upload documents, then persist the record)
//! - status projection and examination actions for the applicant dashboard
//! - registration, sign-in and the session boundary
//!
//! **No API concerns**: HTTP servers and cookie handling belong in `api-rest`. Backends are
//! reached only through the traits in [`backend`].

pub mod backend;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod examination;
pub mod notify;
pub mod record;
pub mod rules;
pub mod schema;
pub mod session;
pub mod status;
pub mod steps;
pub mod submission;
pub mod validation;

mod error;

pub use config::CoreConfig;
pub use error::{AdmissionError, AdmissionResult};
pub use session::{AuthBoundary, SessionContext};
pub use submission::{SubmissionPipeline, SubmissionReceipt};
