//! Registration, sign-in and the session context.
//!
//! A [`SessionContext`] is the only way the rest of the crate learns who the applicant is.
//! It is only handed out after the role gate, and signing out consumes it.

use crate::backend::{AuthService, Credential, DocumentStore};
use crate::constants::{APPLICANT_ROLE, USERS_COLLECTION};
use crate::record::{from_data, to_data, UserRecord};
use crate::schema::{RegistrationDraft, StudentType};
use crate::validation::validate_registration;
use crate::{AdmissionError, AdmissionResult};
use admission_types::EmailAddress;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub student_type: StudentType,
}

/// An authenticated applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: String,
    token: String,
    profile: Profile,
}

impl SessionContext {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }
}

#[derive(Clone)]
pub struct AuthBoundary {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DocumentStore>,
}

impl AuthBoundary {
    pub fn new(auth: Arc<dyn AuthService>, store: Arc<dyn DocumentStore>) -> Self {
        Self { auth, store }
    }

    /// Validates the registration, creates the account and writes `users/<uid>`.
    ///
    /// The applicant is not signed in afterwards; the sign-up credential is revoked once
    /// the profile is written. Returns the new uid.
    pub async fn register(&self, draft: &RegistrationDraft) -> AdmissionResult<String> {
        let mut draft = draft.clone();
        draft.sanitize();
        let registration =
            validate_registration(&draft).map_err(AdmissionError::RegistrationInvalid)?;

        let credential = self
            .auth
            .sign_up(&registration.email, &registration.password)
            .await?;
        let uid = credential.identity.uid.clone();

        let user = UserRecord {
            name: registration.name.into_string(),
            email: registration.email.as_str().to_string(),
            phone_number: registration.phone_number.as_str().to_string(),
            student_type: registration.student_type,
            role: APPLICANT_ROLE.to_string(),
            created_at: Utc::now().timestamp_millis(),
            is_active: true,
        };
        let written = self.write_profile(&uid, &user).await;
        self.auth.sign_out(&credential.token).await?;
        written?;

        tracing::info!(uid = %uid, student_type = %user.student_type, "applicant registered");
        Ok(uid)
    }

    async fn write_profile(&self, uid: &str, user: &UserRecord) -> AdmissionResult<()> {
        self.store.set(USERS_COLLECTION, uid, to_data(user)?).await?;
        Ok(())
    }

    /// Checks credentials, then applies the role gate.
    pub async fn sign_in(&self, email: &str, password: &str) -> AdmissionResult<SessionContext> {
        let email = EmailAddress::parse(email)
            .map_err(|_| AdmissionError::InvalidInput("Invalid email address".into()))?;
        let credential = self.auth.sign_in(&email, password).await?;
        self.establish(credential).await
    }

    /// Builds a session from an already issued token, applying the same role gate.
    pub async fn resume(&self, token: &str) -> AdmissionResult<SessionContext> {
        let identity = self.auth.verify_token(token).await?;
        self.establish(Credential {
            identity,
            token: token.to_string(),
        })
        .await
    }

    pub async fn sign_out(&self, session: SessionContext) -> AdmissionResult<()> {
        self.auth.sign_out(&session.token).await?;
        tracing::info!(uid = %session.user_id, "signed out");
        Ok(())
    }

    async fn establish(&self, credential: Credential) -> AdmissionResult<SessionContext> {
        let uid = credential.identity.uid;
        let user = match self.store.get(USERS_COLLECTION, &uid).await? {
            Some(document) => Some(from_data::<UserRecord>(&document.data)?),
            None => None,
        };

        let Some(user) = user.filter(|user| user.role == APPLICANT_ROLE) else {
            tracing::warn!(uid = %uid, "sign-in refused by role gate");
            self.auth.sign_out(&credential.token).await?;
            return Err(AdmissionError::AccessDenied);
        };

        Ok(SessionContext {
            user_id: uid,
            token: credential.token,
            profile: Profile {
                name: user.name,
                email: user.email,
                student_type: user.student_type,
            },
        })
    }
}
