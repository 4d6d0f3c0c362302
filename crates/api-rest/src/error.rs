//! Maps core outcomes onto HTTP responses.
//!
//! Every failure body carries the destructive [`Notification`] the applicant sees, plus the
//! field errors when the failure was a validation failure.

use admission_core::backend::BackendError;
use admission_core::notify::Notification;
use admission_core::AdmissionError;
use admission_files::FilesError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug)]
pub struct ApiError(pub AdmissionError);

impl From<AdmissionError> for ApiError {
    fn from(error: AdmissionError) -> Self {
        Self(error)
    }
}

impl From<BackendError> for ApiError {
    fn from(error: BackendError) -> Self {
        Self(AdmissionError::Backend(error))
    }
}

impl From<FilesError> for ApiError {
    fn from(error: FilesError) -> Self {
        Self(AdmissionError::Files(error))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    notification: Notification,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AdmissionError::Validation(_) | AdmissionError::RegistrationInvalid(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AdmissionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AdmissionError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AdmissionError::AccessDenied => StatusCode::FORBIDDEN,
            AdmissionError::AlreadyApplied
            | AdmissionError::SlotAlreadyFilled(_)
            | AdmissionError::NotReadyToComplete(_) => StatusCode::CONFLICT,
            AdmissionError::NoAdmission | AdmissionError::NoExamination => StatusCode::NOT_FOUND,
            AdmissionError::Backend(backend) => match backend {
                BackendError::InvalidCredentials | BackendError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                BackendError::EmailInUse | BackendError::AlreadyExists { .. } => {
                    StatusCode::CONFLICT
                }
                BackendError::WeakPassword { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                BackendError::NotFound { .. } => StatusCode::NOT_FOUND,
                BackendError::Storage(_) | BackendError::Upload(_) => StatusCode::BAD_GATEWAY,
            },
            AdmissionError::Files(FilesError::NotFound(_)) => StatusCode::NOT_FOUND,
            AdmissionError::Files(FilesError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
            AdmissionError::Files(_)
            | AdmissionError::RecordShape { .. }
            | AdmissionError::Serialization(_)
            | AdmissionError::StorageDirCreation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field_errors(&self) -> Option<Value> {
        let errors = match &self.0 {
            AdmissionError::Validation(errors) => serde_json::to_value(errors),
            AdmissionError::RegistrationInvalid(errors) => serde_json::to_value(errors),
            _ => return None,
        };
        errors.ok()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self.0);
        } else {
            tracing::warn!(status = status.as_u16(), "request refused: {}", self.0);
        }

        let body = ErrorBody {
            notification: Notification::failure(&self.0),
            errors: self.field_errors(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
