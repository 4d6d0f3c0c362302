//! Admission blob storage
//!
//! Stores uploaded document images and examination screenshots as plain files under a single
//! root directory. Callers address blobs by a [`BlobPath`], a relative, traversal-safe path
//! derived deterministically from the upload's folder, its content digest, and its original
//! filename:
//!
//! ```text
//! <root>/
//! ├── documents/
//! │   └── tor/
//! │       └── 3f9e0a1b2c4d-transcript.png
//! └── screenshots/
//!     └── ab12cd34ef56-receipt.jpg
//! ```
//!
//! The digest prefix keeps two different files that share a filename from overwriting each
//! other, while re-uploading identical bytes under the same name lands on the same path.
//!
//! ## Example Usage
//!
//! ```no_run
//! use admission_files::{BlobPath, BlobStorageService};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = BlobStorageService::new(Path::new("admission_data/files"))?;
//! let bytes = std::fs::read("tor.png")?;
//! let path = BlobPath::for_upload("documents/tor", "tor.png", &bytes)?;
//! let stored = service.put(&path, &bytes)?;
//! println!("stored {} bytes at {}", stored.size_bytes, stored.path);
//! # Ok(())
//! # }
//! ```

mod constants;
mod files;

pub use constants::{DIGEST_PREFIX_LEN, MAX_PATH_SEGMENT_LEN};
pub use files::{detect_media_type, BlobPath, BlobStorageService, StoredBlob};

/// Errors that can occur during blob operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed (potential directory traversal or unsafe path)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No blob stored at the requested path
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
