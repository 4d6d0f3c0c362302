//! Applicant registration form.

use crate::rules::{FieldSource, FieldValue};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentType {
    New,
    Returning,
    Transferee,
}

impl StudentType {
    pub const ALL: [StudentType; 3] = [
        StudentType::New,
        StudentType::Returning,
        StudentType::Transferee,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StudentType::New => "new",
            StudentType::Returning => "returning",
            StudentType::Transferee => "transferee",
        }
    }

    pub fn parse(value: &str) -> Option<StudentType> {
        StudentType::ALL.into_iter().find(|t| t.key() == value)
    }

    /// Checklist shown once the student type is chosen on the registration form.
    pub fn requirements(self) -> &'static [&'static str] {
        match self {
            StudentType::New => &[
                "Honorable Dismissal",
                "TOR (Photocopy)",
                "Gen. Weighted Average",
                "Birth Certificate",
                "Marriage Certificate (If married)",
                "2x2 ID Picture",
            ],
            StudentType::Returning => &["Fill out registration form", "Payment/Down payment"],
            StudentType::Transferee => &["Refresh at least 9 units or 3 subjects"],
        }
    }

    /// Enrollment procedure for this student type. Returning students skip the
    /// credential and entrance exam steps.
    pub fn enrollment_procedure(self) -> Vec<&'static str> {
        ENROLLMENT_PROCEDURE
            .iter()
            .filter(|(_, returning_step)| *returning_step || self != StudentType::Returning)
            .map(|(text, _)| *text)
            .collect()
    }
}

/// `(step, applies to returning students)`
const ENROLLMENT_PROCEDURE: [(&str, bool); 8] = [
    ("Present first all credentials needed", false),
    ("Evaluation of TOR et al.", false),
    ("Entrance Exam", false),
    ("Fill up Registration Form", true),
    ("Assigning of Subjects", true),
    ("Proceed to the Registration Office (For Encoding of Subjects)", true),
    ("Finance Office (Downpayment/Full Payment)", true),
    ("Back to Graduation School Office for the assessment", true),
];

impl fmt::Display for StudentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegistrationField {
    Name,
    PhoneNumber,
    Email,
    Password,
    ConfirmPassword,
    StudentType,
}

impl RegistrationField {
    pub fn key(self) -> &'static str {
        match self {
            RegistrationField::Name => "name",
            RegistrationField::PhoneNumber => "phoneNumber",
            RegistrationField::Email => "email",
            RegistrationField::Password => "password",
            RegistrationField::ConfirmPassword => "confirmPassword",
            RegistrationField::StudentType => "type",
        }
    }
}

impl fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for RegistrationField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.key())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationDraft {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(rename = "type")]
    pub student_type: String,
}

impl RegistrationDraft {
    /// Applies the name and phone input filters.
    pub fn sanitize(&mut self) {
        self.name = admission_types::sanitize_person_name(&self.name);
        self.phone_number = admission_types::sanitize_phone_number(&self.phone_number);
    }
}

impl FieldSource<RegistrationField> for RegistrationDraft {
    fn value(&self, field: RegistrationField) -> FieldValue<'_> {
        FieldValue::Text(match field {
            RegistrationField::Name => self.name.as_str(),
            RegistrationField::PhoneNumber => self.phone_number.as_str(),
            RegistrationField::Email => self.email.as_str(),
            RegistrationField::Password => self.password.as_str(),
            RegistrationField::ConfirmPassword => self.confirm_password.as_str(),
            RegistrationField::StudentType => self.student_type.as_str(),
        })
    }
}
