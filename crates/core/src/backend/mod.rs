//! Backend collaborators: authentication, document storage and blob storage.
//!
//! The portal core only talks to these traits. Local implementations back the REST
//! server and the test suite; a hosted backend can be swapped in behind the same seams.

mod auth;
mod blob;
mod local;
mod subscription;

pub use auth::LocalAuthService;
pub use blob::LocalBlobStore;
pub use local::LocalDocumentStore;
pub use subscription::Subscription;

use admission_files::BlobPath;
use admission_types::EmailAddress;
use async_trait::async_trait;
use serde_json::Value;

/// Field map of a stored document.
pub type DocumentData = serde_json::Map<String, Value>;

/// Callback invoked with the full result set of a subscribed query.
pub type UpdateCallback = Box<dyn FnMut(Vec<Document>) + Send + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("an account with this email already exists")]
    EmailInUse,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("session token is invalid or has been revoked")]
    InvalidToken,
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },
    #[error("document {collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("upload failed: {0}")]
    Upload(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: DocumentData,
}

/// A live or one-shot read: a filtered collection, or one document by id.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Collection {
        collection: String,
        filter: Option<(String, Value)>,
    },
    Document {
        collection: String,
        id: String,
    },
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Query::Collection {
            collection: collection.into(),
            filter: None,
        }
    }

    pub fn document(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Query::Document {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Restricts a collection query to documents whose `field` equals `value`.
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        match self {
            Query::Collection { collection, .. } => Query::Collection {
                collection,
                filter: Some((field.into(), value.into())),
            },
            document => document,
        }
    }

    pub fn collection_name(&self) -> &str {
        match self {
            Query::Collection { collection, .. } | Query::Document { collection, .. } => {
                collection
            }
        }
    }

    /// Returns true if a write to `collection`/`id` can change this query's result.
    pub fn is_affected_by(&self, collection: &str, id: &str) -> bool {
        match self {
            Query::Collection { collection: c, .. } => c == collection,
            Query::Document {
                collection: c,
                id: wanted,
            } => c == collection && wanted == id,
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Query::Collection { filter: None, .. } => true,
            Query::Collection {
                filter: Some((field, value)),
                ..
            } => document.data.get(field) == Some(value),
            Query::Document { id, .. } => &document.id == id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: EmailAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub identity: Identity,
    pub token: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &EmailAddress, password: &str) -> BackendResult<Credential>;

    async fn sign_in(&self, email: &EmailAddress, password: &str) -> BackendResult<Credential>;

    /// Revokes `token`. Revoking an unknown token is not an error.
    async fn sign_out(&self, token: &str) -> BackendResult<()>;

    async fn verify_token(&self, token: &str) -> BackendResult<Identity>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a new document under a generated id and returns the id.
    async fn create(&self, collection: &str, data: DocumentData) -> BackendResult<String>;

    /// Creates or replaces the document at `collection`/`id`.
    async fn set(&self, collection: &str, id: &str, data: DocumentData) -> BackendResult<()>;

    async fn get(&self, collection: &str, id: &str) -> BackendResult<Option<Document>>;

    async fn query(&self, query: &Query) -> BackendResult<Vec<Document>>;

    /// Shallow merge: top-level keys of `patch` replace the stored keys.
    async fn update(&self, collection: &str, id: &str, patch: DocumentData) -> BackendResult<()>;

    /// Delivers the current result set immediately, then again after every write that can
    /// change it, until the returned [`Subscription`] is dropped.
    ///
    /// Must be called from within a tokio runtime.
    fn subscribe(&self, query: Query, on_update: UpdateCallback) -> Subscription;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path`, overwriting any existing blob.
    async fn put(&self, path: &BlobPath, bytes: &[u8]) -> BackendResult<()>;

    /// Resolves a stored path to its download URL.
    fn resolve(&self, path: &BlobPath) -> String;
}
