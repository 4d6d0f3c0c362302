//! Constants used throughout the admission core crate.
//!
//! Collection names and storage folders live here so the wire contract with an external
//! backend stays in one place.

/// Collection holding one profile document per registered user, keyed by auth uid.
pub const USERS_COLLECTION: &str = "users";

/// Collection holding one credential document per account, keyed by auth uid.
pub const ACCOUNTS_COLLECTION: &str = "accounts";

/// Field on an account document holding the normalised sign-in email.
pub const ACCOUNT_EMAIL_FIELD: &str = "email";

/// Collection holding submitted admission applications.
pub const ADMISSIONS_COLLECTION: &str = "admissions";

/// Collection holding examination form documents referenced by `examination.examForm`.
pub const EXAMINATIONS_COLLECTION: &str = "examinations";

/// Field on an admission document that links it to its applicant.
pub const ADMISSION_USER_FIELD: &str = "userId";

/// Blob folder prefix for application documents: `documents/<slot>/...`.
pub const DOCUMENTS_FOLDER: &str = "documents";

/// Blob folder for examination proof and payment receipt screenshots.
pub const SCREENSHOTS_FOLDER: &str = "screenshots";

/// Route to the admission form, shown when the applicant has not applied yet.
pub const ADMISSION_FORM_LINK: &str = "/admission/form";

/// Role value that grants access to the applicant portal.
pub const APPLICANT_ROLE: &str = "user";

/// Minimum password length accepted by the local auth service.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Default directory for admission data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "admission_data";

/// Sub-directory of the data directory holding JSON records.
pub const RECORDS_DIR_NAME: &str = "records";

/// Sub-directory of the data directory holding uploaded blobs.
pub const FILES_DIR_NAME: &str = "files";

/// Default public base URL used to build download links for stored blobs.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

/// Default session cookie name.
pub const DEFAULT_SESSION_COOKIE: &str = "session";
