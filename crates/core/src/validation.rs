//! Rule evaluation.
//!
//! [`evaluate`] runs a rule table against a [`FieldSource`], optionally scoped to a subset
//! of fields, and collects at most one error per field in rule order. Scoped evaluation
//! backs per-step validation; whole-form evaluation produces a [`ValidatedForm`], the only
//! input the submission pipeline accepts.

use crate::rules::{admission_rules, registration_rules, FieldSource, FieldValue, Rule};
use crate::schema::{
    DocumentAttachments, FieldPath, FormDetails, FormDraft, RegistrationDraft,
    RegistrationField, StudentType,
};
use crate::steps::Step;
use admission_types::{EmailAddress, NonEmptyText, PhoneNumber};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ErrorKind {
    Required,
    NotAnOption { value: String },
    InvalidEmail,
    TooFewDigits { min: usize, actual: usize },
    Mismatch,
    MissingFile,
    EmptyFile,
    UnsupportedFileType { content_type: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Required => f.write_str("This field is required"),
            ErrorKind::NotAnOption { value } => {
                write!(f, "'{value}' is not one of the available options")
            }
            ErrorKind::InvalidEmail => f.write_str("Invalid email address"),
            ErrorKind::TooFewDigits { min, .. } => write!(f, "Must contain at least {min} digits"),
            ErrorKind::Mismatch => f.write_str("Passwords do not match"),
            ErrorKind::MissingFile => f.write_str("File is required"),
            ErrorKind::EmptyFile => f.write_str("File is empty"),
            ErrorKind::UnsupportedFileType { content_type } => {
                write!(f, "Only PNG and JPEG files are accepted, got '{content_type}'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError<F> {
    pub field: F,
    #[serde(flatten)]
    pub kind: ErrorKind,
}

/// Field errors in rule order, at most one per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors<F> {
    errors: Vec<FieldError<F>>,
}

impl<F> Default for ValidationErrors<F> {
    fn default() -> Self {
        Self { errors: Vec::new() }
    }
}

impl<F: Copy + Eq> ValidationErrors<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: F, kind: ErrorKind) -> Self {
        Self {
            errors: vec![FieldError { field, kind }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: F) -> Option<&ErrorKind> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| &error.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError<F>> {
        self.errors.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
        self.errors.iter().map(|error| error.field)
    }

    fn push(&mut self, field: F, kind: ErrorKind) {
        self.errors.push(FieldError { field, kind });
    }
}

impl<F: fmt::Display> fmt::Display for ValidationErrors<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.kind)?;
        }
        Ok(())
    }
}

/// Evaluates `rules` against `source`, skipping fields for which `in_scope` is false.
pub fn evaluate<F, S>(
    rules: &[Rule<F>],
    source: &S,
    in_scope: impl Fn(F) -> bool,
) -> ValidationErrors<F>
where
    F: Copy + Eq,
    S: FieldSource<F> + ?Sized,
{
    let mut errors = ValidationErrors::new();
    for rule in rules {
        let field = rule.field();
        if !in_scope(field) || errors.get(field).is_some() {
            continue;
        }
        if let Err(kind) = check(rule, source) {
            errors.push(field, kind);
        }
    }
    errors
}

fn check<F, S>(rule: &Rule<F>, source: &S) -> Result<(), ErrorKind>
where
    F: Copy,
    S: FieldSource<F> + ?Sized,
{
    match *rule {
        Rule::Required(field) => required(source.value(field)),
        Rule::RequiredWhen { field, when } => {
            if when.holds(source) {
                required(source.value(field))
            } else {
                Ok(())
            }
        }
        Rule::OneOf { field, options } => match source.value(field).as_text() {
            Some(text) if !text.trim().is_empty() && !options.contains(&text) => {
                Err(ErrorKind::NotAnOption {
                    value: text.to_string(),
                })
            }
            _ => Ok(()),
        },
        Rule::Email(field) => {
            let value = source.value(field);
            required(value)?;
            EmailAddress::parse(value.as_text().unwrap_or_default())
                .map(|_| ())
                .map_err(|_| ErrorKind::InvalidEmail)
        }
        Rule::MinDigits { field, min } => {
            let value = source.value(field);
            required(value)?;
            let actual = value
                .as_text()
                .unwrap_or_default()
                .chars()
                .filter(char::is_ascii_digit)
                .count();
            if actual < min {
                return Err(ErrorKind::TooFewDigits { min, actual });
            }
            Ok(())
        }
        Rule::Confirms { field, original } => {
            if source.value(field) == source.value(original) {
                Ok(())
            } else {
                Err(ErrorKind::Mismatch)
            }
        }
        Rule::Document { field, mandatory } => match source.value(field) {
            FieldValue::Attachment(Some(attachment)) => attachment.check(),
            FieldValue::Attachment(None) if mandatory => Err(ErrorKind::MissingFile),
            _ => Ok(()),
        },
    }
}

fn required(value: FieldValue<'_>) -> Result<(), ErrorKind> {
    if value.is_blank() {
        Err(ErrorKind::Required)
    } else {
        Ok(())
    }
}

/// Validates only the fields owned by `step`.
pub fn validate_step(draft: &FormDraft, step: Step) -> Result<(), ValidationErrors<FieldPath>> {
    let errors = evaluate(&admission_rules(), draft, |field| step.owns(field));
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A draft that passed whole-form validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    details: FormDetails,
    date_of_birth: NaiveDate,
    documents: DocumentAttachments,
}

impl ValidatedForm {
    pub fn details(&self) -> &FormDetails {
        &self.details
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    pub fn documents(&self) -> &DocumentAttachments {
        &self.documents
    }

    pub fn into_parts(self) -> (FormDetails, NaiveDate, DocumentAttachments) {
        (self.details, self.date_of_birth, self.documents)
    }
}

/// Validates every field of the form.
pub fn validate_form(draft: &FormDraft) -> Result<ValidatedForm, ValidationErrors<FieldPath>> {
    let errors = evaluate(&admission_rules(), draft, |_| true);
    if !errors.is_empty() {
        return Err(errors);
    }
    let date_of_birth = draft
        .date_of_birth
        .ok_or_else(|| ValidationErrors::single(FieldPath::DateOfBirth, ErrorKind::Required))?;

    Ok(ValidatedForm {
        details: draft.details.clone(),
        date_of_birth,
        documents: draft.documents.clone(),
    })
}

/// A registration that passed validation. The password is kept only long enough to
/// hand it to the auth service.
#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub phone_number: PhoneNumber,
    pub password: String,
    pub student_type: StudentType,
}

pub fn validate_registration(
    draft: &RegistrationDraft,
) -> Result<ValidatedRegistration, ValidationErrors<RegistrationField>> {
    let errors = evaluate(&registration_rules(), draft, |_| true);
    if !errors.is_empty() {
        return Err(errors);
    }

    let invalid = |field, kind| ValidationErrors::single(field, kind);
    Ok(ValidatedRegistration {
        name: NonEmptyText::new(&draft.name)
            .map_err(|_| invalid(RegistrationField::Name, ErrorKind::Required))?,
        email: EmailAddress::parse(&draft.email)
            .map_err(|_| invalid(RegistrationField::Email, ErrorKind::InvalidEmail))?,
        phone_number: PhoneNumber::parse(&draft.phone_number)
            .map_err(|_| invalid(RegistrationField::PhoneNumber, ErrorKind::Required))?,
        password: draft.password.clone(),
        student_type: StudentType::parse(&draft.student_type).ok_or_else(|| {
            invalid(
                RegistrationField::StudentType,
                ErrorKind::NotAnOption {
                    value: draft.student_type.clone(),
                },
            )
        })?,
    })
}
