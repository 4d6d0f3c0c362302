//! Validated text types shared across the admission workspace.
//!
//! Each type guarantees its invariant once constructed, so downstream code can rely on it
//! without re-checking. Sanitisers for input-time filtering live here too, because the same
//! filtering applies to the registration form and the admission form.

/// Number of digits a phone number must carry.
pub const PHONE_NUMBER_DIGITS: usize = 11;

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input is not a plausible email address
    #[error("Invalid email address")]
    InvalidEmail,

    /// The input has fewer digits than required
    #[error("Phone number must have at least {min} digits, got {actual}")]
    TooFewDigits { min: usize, actual: usize },
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// An email address that passed a syntactic plausibility check.
///
/// The address is trimmed and lowercased, so two spellings of the same mailbox compare equal.
/// Deliverability is the auth service's concern, not this type's.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses an email address.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::InvalidEmail`] when the
    /// input does not have exactly one `@` separating a non-empty local part from a dotted
    /// domain, or contains whitespace.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TextError::InvalidEmail);
        }

        let mut parts = trimmed.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TextError::InvalidEmail);
        };

        let domain_ok = domain.contains('.') && domain.split('.').all(|label| !label.is_empty());

        if local.is_empty() || !domain_ok {
            return Err(TextError::InvalidEmail);
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for EmailAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EmailAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A phone number made of digits only, at least [`PHONE_NUMBER_DIGITS`] long.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses an already-sanitised phone number.
    ///
    /// Non-digit characters are stripped first (see [`sanitize_phone_number`]), then the
    /// remaining digit count is checked.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let digits = sanitize_phone_number(input.as_ref());
        if digits.is_empty() {
            return Err(TextError::Empty);
        }
        if digits.len() < PHONE_NUMBER_DIGITS {
            return Err(TextError::TooFewDigits {
                min: PHONE_NUMBER_DIGITS,
                actual: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips every character that is not an ASCII letter or whitespace.
///
/// Applied when a name field is edited, not at submit time.
pub fn sanitize_person_name(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect()
}

/// Keeps ASCII digits only and truncates to [`PHONE_NUMBER_DIGITS`].
pub fn sanitize_phone_number(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(PHONE_NUMBER_DIGITS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  Manila ").unwrap().as_str(), "Manila");
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"");
        assert!(err.is_err());
    }

    #[test]
    fn email_parse_accepts_and_lowercases() {
        let email = EmailAddress::parse(" Juan.Dela@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "juan.dela@example.com");
    }

    #[test]
    fn email_parse_rejects_malformed() {
        for bad in ["juan", "juan@", "@example.com", "a@b@c.com", "juan@example", "ju an@x.com", "a@x..com"] {
            assert_eq!(EmailAddress::parse(bad), Err(TextError::InvalidEmail), "{bad}");
        }
        assert_eq!(EmailAddress::parse(""), Err(TextError::Empty));
    }

    #[test]
    fn name_sanitiser_strips_digits_and_symbols() {
        assert_eq!(sanitize_person_name("Ma. Cruz-3rd"), "Ma Cruzrd");
        assert_eq!(sanitize_person_name("Ana Lou"), "Ana Lou");
    }

    #[test]
    fn phone_sanitiser_keeps_digits_and_truncates() {
        assert_eq!(sanitize_phone_number("0917-123-4567"), "09171234567");
        assert_eq!(sanitize_phone_number("+63 917 123 45678"), "63917123456");
    }

    #[test]
    fn phone_parse_requires_eleven_digits() {
        assert_eq!(PhoneNumber::parse("0917 123 4567").unwrap().as_str(), "09171234567");
        assert_eq!(
            PhoneNumber::parse("0917123"),
            Err(TextError::TooFewDigits { min: 11, actual: 7 })
        );
        assert_eq!(PhoneNumber::parse("abc"), Err(TextError::Empty));
    }
}
