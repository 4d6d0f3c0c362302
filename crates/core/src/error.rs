use crate::backend::BackendError;
use crate::examination::ExamSlot;
use crate::schema::{FieldPath, RegistrationField};
use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Validation(ValidationErrors<FieldPath>),
    #[error("{0}")]
    RegistrationInvalid(ValidationErrors<RegistrationField>),
    #[error("User is not authorized")]
    AccessDenied,
    #[error("not signed in")]
    Unauthenticated,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("you have already submitted an admission application")]
    AlreadyApplied,
    #[error("no admission application found")]
    NoAdmission,
    #[error("no examination has been scheduled")]
    NoExamination,
    #[error("the examination {0} screenshot has already been uploaded")]
    SlotAlreadyFilled(ExamSlot),
    #[error("examination cannot be marked as complete: {0}")]
    NotReadyToComplete(String),
    #[error("stored record does not match the expected shape at '{path}': {message}")]
    RecordShape { path: String, message: String },
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("file storage error: {0}")]
    Files(#[from] admission_files::FilesError),
}

pub type AdmissionResult<T> = std::result::Result<T, AdmissionError>;
