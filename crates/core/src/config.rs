//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Nothing in this crate reads environment variables during request handling.

use crate::constants::{ADMISSION_FORM_LINK, FILES_DIR_NAME, RECORDS_DIR_NAME};
use crate::{AdmissionError, AdmissionResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    public_base_url: String,
    session_cookie_name: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `public_base_url` must start with `http://` or `https://` and must not end with `/`.
    /// `session_cookie_name` may only contain ASCII letters, digits, `_` and `-`.
    pub fn new(
        data_dir: PathBuf,
        public_base_url: String,
        session_cookie_name: String,
    ) -> AdmissionResult<Self> {
        let public_base_url = public_base_url.trim().to_string();
        if !(public_base_url.starts_with("http://") || public_base_url.starts_with("https://")) {
            return Err(AdmissionError::InvalidInput(
                "public base URL must start with http:// or https://".into(),
            ));
        }
        if public_base_url.ends_with('/') {
            return Err(AdmissionError::InvalidInput(
                "public base URL must not end with '/'".into(),
            ));
        }

        let cookie_ok = !session_cookie_name.is_empty()
            && session_cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !cookie_ok {
            return Err(AdmissionError::InvalidInput(format!(
                "invalid session cookie name: '{session_cookie_name}'"
            )));
        }

        Ok(Self {
            data_dir,
            public_base_url,
            session_cookie_name,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join(RECORDS_DIR_NAME)
    }

    pub fn files_dir(&self) -> PathBuf {
        self.data_dir.join(FILES_DIR_NAME)
    }

    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    pub fn session_cookie_name(&self) -> &str {
        &self.session_cookie_name
    }

    pub fn form_link(&self) -> &'static str {
        ADMISSION_FORM_LINK
    }

    /// Creates the records and files directories if they do not exist yet.
    pub fn ensure_data_dirs(&self) -> AdmissionResult<()> {
        std::fs::create_dir_all(self.records_dir()).map_err(AdmissionError::StorageDirCreation)?;
        std::fs::create_dir_all(self.files_dir()).map_err(AdmissionError::StorageDirCreation)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(url: &str, cookie: &str) -> AdmissionResult<CoreConfig> {
        CoreConfig::new(PathBuf::from("data"), url.into(), cookie.into())
    }

    #[test]
    fn accepts_well_formed_values() {
        let cfg = config("https://portal.example.edu", "session").unwrap();
        assert_eq!(cfg.public_base_url(), "https://portal.example.edu");
        assert_eq!(cfg.records_dir(), PathBuf::from("data").join("records"));
        assert_eq!(cfg.files_dir(), PathBuf::from("data").join("files"));
        assert_eq!(cfg.form_link(), "/admission/form");
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(config("ftp://portal", "session").is_err());
        assert!(config("http://portal/", "session").is_err());
    }

    #[test]
    fn rejects_bad_cookie_name() {
        assert!(config("http://localhost:3000", "").is_err());
        assert!(config("http://localhost:3000", "my session").is_err());
        assert!(config("http://localhost:3000", "sid;x").is_err());
    }

    #[test]
    fn ensure_data_dirs_creates_layout() {
        let temp = TempDir::new().unwrap();
        let cfg = CoreConfig::new(
            temp.path().join("admission_data"),
            "http://localhost:3000".into(),
            "session".into(),
        )
        .unwrap();

        cfg.ensure_data_dirs().unwrap();
        assert!(cfg.records_dir().is_dir());
        assert!(cfg.files_dir().is_dir());
    }
}
