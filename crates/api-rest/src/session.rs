//! Resolves the caller's session from the session cookie or a bearer token.

use crate::error::ApiError;
use crate::AppState;
use admission_core::backend::BackendError;
use admission_core::{AdmissionError, SessionContext};
use api_shared::{parse_bearer, read_cookie};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap,
    },
};

/// The signed-in applicant. Handlers taking this extractor answer 401 without a live session.
pub struct CurrentSession(pub SessionContext);

/// The cookie wins over the `Authorization` header when both are present.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| read_cookie(header, cookie_name));

    from_cookie
        .or_else(|| {
            let header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
            parse_bearer(header).ok()
        })
        .map(str::to_owned)
}

/// A revoked or unknown token means the same thing as no token at all.
pub(crate) fn unauthenticated_if_revoked(error: AdmissionError) -> AdmissionError {
    match error {
        AdmissionError::Backend(BackendError::InvalidToken) => AdmissionError::Unauthenticated,
        other => other,
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, state.cfg.session_cookie_name())
            .ok_or(AdmissionError::Unauthenticated)?;
        let session = state
            .auth
            .resume(&token)
            .await
            .map_err(unauthenticated_if_revoked)?;
        Ok(Self(session))
    }
}
