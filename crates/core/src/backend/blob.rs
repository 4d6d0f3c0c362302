//! Blob storage on the local filesystem, served back under `<base>/files/<path>`.

use super::{BackendError, BackendResult, BlobStore};
use admission_files::{BlobPath, BlobStorageService};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    files: BlobStorageService,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(files: BlobStorageService, public_base_url: impl Into<String>) -> Self {
        Self {
            files,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn files(&self) -> &BlobStorageService {
        &self.files
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, path: &BlobPath, bytes: &[u8]) -> BackendResult<()> {
        let files = self.files.clone();
        let path = path.clone();
        let bytes = bytes.to_vec();
        let stored = tokio::task::spawn_blocking(move || files.put(&path, &bytes))
            .await
            .map_err(|e| BackendError::Upload(format!("upload task failed: {e}")))?
            .map_err(|e| BackendError::Upload(e.to_string()))?;

        tracing::debug!(
            path = %stored.path.as_str(),
            size_bytes = stored.size_bytes,
            "blob stored"
        );
        Ok(())
    }

    fn resolve(&self, path: &BlobPath) -> String {
        format!("{}/files/{}", self.public_base_url, path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn put_writes_under_root_and_resolves_to_url() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(
            BlobStorageService::new(temp.path()).unwrap(),
            "http://localhost:3000",
        );
        let path = BlobPath::parse("documents/tor/abc-tor.png").unwrap();

        store.put(&path, b"bytes").await.unwrap();

        assert!(temp.path().join("documents/tor/abc-tor.png").is_file());
        assert_eq!(
            store.resolve(&path),
            "http://localhost:3000/files/documents/tor/abc-tor.png"
        );
    }
}
