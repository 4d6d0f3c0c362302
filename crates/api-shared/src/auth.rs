//! Session transport: bearer tokens on the way in, an HTTP-only cookie afterwards.
//!
//! The token itself is opaque here; verifying it is the auth boundary's job.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthHeaderError {
    #[error("missing authorization header")]
    Missing,
    #[error("authorization header must use the Bearer scheme")]
    WrongScheme,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively. Surrounding whitespace is ignored, so a header
/// with no token after the scheme is reported as [`AuthHeaderError::WrongScheme`].
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthHeaderError> {
    let header = header.ok_or(AuthHeaderError::Missing)?.trim();
    let (scheme, token) = header.split_once(' ').ok_or(AuthHeaderError::WrongScheme)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthHeaderError::WrongScheme);
    }
    Ok(token.trim())
}

/// `Set-Cookie` value establishing the session cookie.
pub fn session_cookie(name: &str, token: &str) -> String {
    format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that expires the session cookie immediately.
pub fn clear_session_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Finds cookie `name` in a `Cookie` request header.
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(parse_bearer(Some("Bearer abc123")), Ok("abc123"));
        assert_eq!(parse_bearer(Some("bearer  abc123 ")), Ok("abc123"));
    }

    #[test]
    fn bearer_rejects_other_schemes_and_blanks() {
        assert_eq!(parse_bearer(None), Err(AuthHeaderError::Missing));
        assert_eq!(parse_bearer(Some("Basic abc")), Err(AuthHeaderError::WrongScheme));
        assert_eq!(parse_bearer(Some("abc123")), Err(AuthHeaderError::WrongScheme));
        assert_eq!(parse_bearer(Some("Bearer   ")), Err(AuthHeaderError::WrongScheme));
    }

    #[test]
    fn cookie_round_trip_through_headers() {
        let set = session_cookie("session", "tok");
        assert!(set.starts_with("session=tok;"));
        assert!(set.contains("HttpOnly"));
        assert!(clear_session_cookie("session").ends_with("Max-Age=0"));

        assert_eq!(read_cookie("theme=dark; session=tok", "session"), Some("tok"));
        assert_eq!(read_cookie("session=", "session"), None);
        assert_eq!(read_cookie("sessionx=tok", "session"), None);
    }
}
