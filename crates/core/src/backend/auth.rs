//! Email/password authentication over the document store.
//!
//! Accounts live at `accounts/<uid>` with a salted SHA-256 digest of the password, so they
//! survive a restart whenever the backing store is persisted. Tokens are random, opaque,
//! held in memory and live until signed out.

use super::{
    AuthService, BackendError, BackendResult, Credential, DocumentData, DocumentStore, Identity,
    LocalDocumentStore, Query,
};
use crate::constants::{ACCOUNTS_COLLECTION, ACCOUNT_EMAIL_FIELD, MIN_PASSWORD_LEN};
use admission_types::EmailAddress;
use admission_uuid::ShardableUuid;
use async_trait::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

/// Stored account document. The password itself is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountRecord {
    email: String,
    salt: String,
    digest: String,
}

impl AccountRecord {
    fn verify(&self, password: &str) -> bool {
        hex::decode(&self.salt)
            .map(|salt| password_digest(&salt, password) == self.digest)
            .unwrap_or(false)
    }
}

pub struct LocalAuthService {
    store: Arc<dyn DocumentStore>,
    sign_ups: Mutex<()>,
    tokens: RwLock<HashMap<String, Identity>>,
}

impl Default for LocalAuthService {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuthService {
    /// Accounts kept in a private in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(LocalDocumentStore::in_memory()))
    }

    /// Accounts kept in `store`; a persisted store keeps them across restarts.
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            sign_ups: Mutex::new(()),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    async fn find_account(
        &self,
        email: &EmailAddress,
    ) -> BackendResult<Option<(String, AccountRecord)>> {
        let query =
            Query::collection(ACCOUNTS_COLLECTION).where_eq(ACCOUNT_EMAIL_FIELD, email.as_str());
        let Some(document) = self.store.query(&query).await?.into_iter().next() else {
            return Ok(None);
        };
        let record = serde_json::from_value(serde_json::Value::Object(document.data))
            .map_err(|e| BackendError::Storage(format!("malformed account {}: {e}", document.id)))?;
        Ok(Some((document.id, record)))
    }

    async fn issue_token(&self, identity: Identity) -> Credential {
        let mut bytes = [0u8; TOKEN_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        self.tokens
            .write()
            .await
            .insert(token.clone(), identity.clone());
        Credential { identity, token }
    }
}

fn password_digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn account_data(record: &AccountRecord) -> BackendResult<DocumentData> {
    match serde_json::to_value(record) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(BackendError::Storage("account must serialize to an object".into())),
        Err(e) => Err(BackendError::Storage(format!("failed to serialize account: {e}"))),
    }
}

#[async_trait]
impl AuthService for LocalAuthService {
    async fn sign_up(&self, email: &EmailAddress, password: &str) -> BackendResult<Credential> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BackendError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }

        let uid = {
            let _serialised = self.sign_ups.lock().await;
            if self.find_account(email).await?.is_some() {
                return Err(BackendError::EmailInUse);
            }
            let mut salt = [0u8; SALT_LEN];
            rand::thread_rng().fill_bytes(&mut salt);
            let record = AccountRecord {
                email: email.as_str().to_string(),
                salt: hex::encode(salt),
                digest: password_digest(&salt, password),
            };
            let uid = ShardableUuid::new().to_string();
            self.store
                .set(ACCOUNTS_COLLECTION, &uid, account_data(&record)?)
                .await?;
            uid
        };

        tracing::info!(uid = %uid, "account created");
        Ok(self
            .issue_token(Identity {
                uid,
                email: email.clone(),
            })
            .await)
    }

    async fn sign_in(&self, email: &EmailAddress, password: &str) -> BackendResult<Credential> {
        let uid = match self.find_account(email).await? {
            Some((uid, record)) if record.verify(password) => uid,
            _ => return Err(BackendError::InvalidCredentials),
        };

        Ok(self
            .issue_token(Identity {
                uid,
                email: email.clone(),
            })
            .await)
    }

    async fn sign_out(&self, token: &str) -> BackendResult<()> {
        self.tokens.write().await.remove(token);
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> BackendResult<Identity> {
        self.tokens
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(BackendError::InvalidToken)
    }
}
