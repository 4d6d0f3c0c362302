//! Filesystem blob storage implementation
//!
//! # Security Model
//!
//! - The root directory is canonicalised at construction time
//! - Every [`BlobPath`] is validated segment by segment: no empty, `.` or `..` segments,
//!   no backslashes, no NUL bytes, no absolute paths
//! - Original filenames are reduced to their final component and a conservative character set
//!   before they become part of a path
//!
//! # Implementation Notes
//!
//! - The service is stateless apart from its root; it can be shared behind an `Arc`
//! - Storing the same bytes under the same filename twice is idempotent (same path, same content)

use crate::constants::{DIGEST_PREFIX_LEN, MAX_PATH_SEGMENT_LEN};
use crate::FilesError;
use admission_types::NonEmptyText;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// A relative, validated storage path such as `documents/tor/3f9e0a1b2c4d-tor.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobPath(String);

impl BlobPath {
    /// Parses and validates a relative blob path.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidPath`] if any segment is empty, `.`/`..`, too long, or
    /// contains a backslash or NUL byte, or if the path is absolute.
    pub fn parse(input: &str) -> Result<Self, FilesError> {
        if input.is_empty() {
            return Err(FilesError::InvalidPath("path cannot be empty".into()));
        }
        if input.starts_with('/') {
            return Err(FilesError::InvalidPath(format!(
                "path must be relative: '{}'",
                input
            )));
        }
        for segment in input.split('/') {
            validate_segment(segment)?;
        }
        Ok(Self(input.to_owned()))
    }

    /// Derives the storage path for an upload.
    ///
    /// The result is `<folder>/<digest prefix>-<filename>`, where the digest is the SHA-256 of
    /// `bytes` and `filename` is the sanitised final component of `original_filename`. When
    /// nothing usable survives sanitising, the filename is the folder's last segment with the
    /// extension of the sniffed media type.
    pub fn for_upload(
        folder: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<Self, FilesError> {
        let mut filename = sanitize_filename(original_filename);
        if filename.is_empty() {
            filename = fallback_filename(folder, bytes);
        }

        let digest = sha256_hex(bytes);
        Self::parse(&format!(
            "{}/{}-{}",
            folder.trim_end_matches('/'),
            &digest[..DIGEST_PREFIX_LEN],
            filename
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for BlobPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlobPath {
    type Error = FilesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BlobPath::parse(&value)
    }
}

impl From<BlobPath> for String {
    fn from(value: BlobPath) -> Self {
        value.0
    }
}

/// Metadata for a stored blob
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct StoredBlob {
    /// Relative storage path
    pub path: BlobPath,

    /// Hexadecimal SHA-256 digest of the content
    pub sha256: String,

    /// Size of the blob in bytes
    pub size_bytes: u64,

    /// Sniffed media type, if recognised
    ///
    /// Best-effort only; callers that need a guarantee must check it themselves.
    pub media_type: Option<NonEmptyText>,

    /// UTC timestamp when the blob was written
    pub stored_at: DateTime<Utc>,
}

/// Service for storing blobs under one root directory
#[derive(Debug, Clone)]
pub struct BlobStorageService {
    root_directory: PathBuf,
}

impl BlobStorageService {
    /// Creates a new `BlobStorageService` rooted at `root_directory`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidRootDirectory`] if the directory does not exist, is not a
    /// directory, or cannot be canonicalised.
    pub fn new(root_directory: &Path) -> Result<Self, FilesError> {
        if !root_directory.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    /// Writes `bytes` at `path`, creating parent directories as needed.
    ///
    /// An existing blob at the same path is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::Io`] if directory creation or the write fails.
    pub fn put(&self, path: &BlobPath, bytes: &[u8]) -> Result<StoredBlob, FilesError> {
        let storage_path = self.storage_path(path);

        if let Some(parent) = storage_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create storage directory {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        fs::write(&storage_path, bytes).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write blob to {}: {}", storage_path.display(), e),
            ))
        })?;

        Ok(StoredBlob {
            path: path.clone(),
            sha256: sha256_hex(bytes),
            size_bytes: bytes.len() as u64,
            media_type: detect_media_type(bytes).and_then(|m| NonEmptyText::new(m).ok()),
            stored_at: Utc::now(),
        })
    }

    /// Reads the blob stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::NotFound`] if nothing is stored there, or [`FilesError::Io`] on
    /// read failure.
    pub fn read(&self, path: &BlobPath) -> Result<Vec<u8>, FilesError> {
        let storage_path = self.storage_path(path);

        if !storage_path.is_file() {
            return Err(FilesError::NotFound(path.to_string()));
        }

        fs::read(&storage_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read blob from {}: {}", storage_path.display(), e),
            ))
        })
    }

    pub fn exists(&self, path: &BlobPath) -> bool {
        self.storage_path(path).is_file()
    }

    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    fn storage_path(&self, path: &BlobPath) -> PathBuf {
        path.as_str()
            .split('/')
            .fold(self.root_directory.clone(), |acc, segment| acc.join(segment))
    }
}

/// Sniffs the media type of `bytes` from their magic number.
pub fn detect_media_type(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn validate_segment(segment: &str) -> Result<(), FilesError> {
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(FilesError::InvalidPath(format!(
            "invalid path segment: '{}'",
            segment
        )));
    }
    if segment.len() > MAX_PATH_SEGMENT_LEN {
        return Err(FilesError::InvalidPath(format!(
            "path segment exceeds {} bytes",
            MAX_PATH_SEGMENT_LEN
        )));
    }
    if segment.contains(['\\', '\0']) {
        return Err(FilesError::InvalidPath(format!(
            "path segment contains a forbidden character: '{}'",
            segment.escape_debug()
        )));
    }
    Ok(())
}

fn fallback_filename(folder: &str, bytes: &[u8]) -> String {
    let stem = folder
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("upload");
    match infer::get(bytes) {
        Some(kind) => format!("{stem}.{}", kind.extension()),
        None => stem.to_string(),
    }
}

fn sanitize_filename(original: &str) -> String {
    let last = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_PATH_SEGMENT_LEN - DIGEST_PREFIX_LEN - 1)
        .collect();

    // A name made only of dots would collapse into a relative segment.
    if cleaned.chars().all(|c| c == '.' || c == '_') {
        String::new()
    } else {
        cleaned
    }
}
