//! Declarative validation and visibility rules.
//!
//! Rules are data: a table of [`Rule`] values evaluated by [`crate::validation`] against
//! anything that implements [`FieldSource`]. Conditional rules and conditional rendering
//! share the same [`Condition`], so a field is required exactly when it is shown.

use crate::schema::{
    Attachment, DocumentSlot, EducationLevel, FieldPath, RegistrationField, SchoolField,
    CIVIL_STATUSES, DEGREE_STATUSES, YES_NO,
};

/// Registration `type` options.
pub const STUDENT_TYPES: &[&str] = &["new", "returning", "transferee"];

/// A field's current value, as seen by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(usize),
    Date(bool),
    Attachment(Option<&'a Attachment>),
}

impl<'a> FieldValue<'a> {
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::List(len) => *len == 0,
            FieldValue::Date(present) => !present,
            FieldValue::Attachment(attachment) => attachment.is_none(),
        }
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            FieldValue::Text(text) => Some(*text),
            _ => None,
        }
    }
}

/// Read access to a form's fields by path.
pub trait FieldSource<F> {
    fn value(&self, field: F) -> FieldValue<'_>;
}

/// A predicate over a discriminant field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition<F> {
    Equals { field: F, value: &'static str },
}

impl<F: Copy> Condition<F> {
    pub fn holds<S: FieldSource<F> + ?Sized>(&self, source: &S) -> bool {
        match self {
            Condition::Equals { field, value } => {
                source.value(*field).as_text() == Some(*value)
            }
        }
    }

    pub fn discriminant(&self) -> F {
        match self {
            Condition::Equals { field, .. } => *field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule<F> {
    /// The field must be non-blank.
    Required(F),
    /// The field must be non-blank whenever `when` holds.
    RequiredWhen { field: F, when: Condition<F> },
    /// A non-blank value must be one of `options`.
    OneOf {
        field: F,
        options: &'static [&'static str],
    },
    /// The field must be a plausible email address.
    Email(F),
    /// The field must contain at least `min` digits.
    MinDigits { field: F, min: usize },
    /// The field must equal `original`. Errors attach to `field`.
    Confirms { field: F, original: F },
    /// A file slot. An attached file is always checked, a missing one only fails when
    /// `mandatory`.
    Document { field: F, mandatory: bool },
}

impl<F: Copy> Rule<F> {
    /// The field this rule reports errors against.
    pub fn field(&self) -> F {
        match self {
            Rule::Required(field)
            | Rule::Email(field)
            | Rule::RequiredWhen { field, .. }
            | Rule::OneOf { field, .. }
            | Rule::MinDigits { field, .. }
            | Rule::Confirms { field, .. }
            | Rule::Document { field, .. } => *field,
        }
    }
}

/// Shows the ceremony multi-select and requires it.
pub const CEREMONY_CONDITION: Condition<FieldPath> = Condition::Equals {
    field: FieldPath::MarriedIsMarried,
    value: "yes",
};

/// Shows the desired degree input and requires it.
pub const DESIRED_DEGREE_CONDITION: Condition<FieldPath> = Condition::Equals {
    field: FieldPath::DegreeStatus,
    value: "degree",
};

/// Shows the marriage certificate upload slot.
pub const MARRIAGE_CERTIFICATE_CONDITION: Condition<FieldPath> = Condition::Equals {
    field: FieldPath::CivilStatus,
    value: "married",
};

/// Fields rendered only while their condition holds.
pub fn conditional_fields() -> [(FieldPath, Condition<FieldPath>); 3] {
    [
        (FieldPath::MarriedCeremony, CEREMONY_CONDITION),
        (FieldPath::DegreeDesiredDegree, DESIRED_DEGREE_CONDITION),
        (
            FieldPath::Document(DocumentSlot::MarriageCertificate),
            MARRIAGE_CERTIFICATE_CONDITION,
        ),
    ]
}

/// Returns whether `field` is currently rendered. Unconditional fields are always visible.
pub fn is_visible<S: FieldSource<FieldPath> + ?Sized>(source: &S, field: FieldPath) -> bool {
    conditional_fields()
        .iter()
        .find(|(conditional, _)| *conditional == field)
        .map_or(true, |(_, condition)| condition.holds(source))
}

/// The admission form rule table.
pub fn admission_rules() -> Vec<Rule<FieldPath>> {
    use FieldPath::*;

    let mut rules = vec![
        Rule::Required(NameFamily),
        Rule::Required(NameFirst),
        Rule::Required(NameMiddle),
        Rule::Required(PermanentAddressTown),
        Rule::Required(PermanentAddressProvince),
        Rule::Required(CivilStatus),
        Rule::OneOf {
            field: CivilStatus,
            options: CIVIL_STATUSES,
        },
        Rule::Required(DateOfBirth),
        Rule::Required(PlaceOfBirth),
        Rule::Required(ReligionName),
        Rule::Required(ReligionBaptized),
        Rule::OneOf {
            field: ReligionBaptized,
            options: YES_NO,
        },
        Rule::Required(ReligionConfirmed),
        Rule::OneOf {
            field: ReligionConfirmed,
            options: YES_NO,
        },
        Rule::Required(MarriedIsMarried),
        Rule::OneOf {
            field: MarriedIsMarried,
            options: YES_NO,
        },
        Rule::RequiredWhen {
            field: MarriedCeremony,
            when: CEREMONY_CONDITION,
        },
    ];

    for level in EducationLevel::ALL {
        for part in SchoolField::ALL {
            rules.push(Rule::Required(PreviousEducation(level, part)));
        }
    }

    rules.extend([
        Rule::Required(UnderGraduateGrade),
        Rule::Required(GradeInMajorSubjects),
        Rule::Required(DegreeStatus),
        Rule::OneOf {
            field: DegreeStatus,
            options: DEGREE_STATUSES,
        },
        Rule::RequiredWhen {
            field: DegreeDesiredDegree,
            when: DESIRED_DEGREE_CONDITION,
        },
        Rule::Required(MajorFieldUnits),
        Rule::Required(MinorFieldUnits),
        Rule::Required(IsFullTimeStudent),
        Rule::OneOf {
            field: IsFullTimeStudent,
            options: YES_NO,
        },
    ]);

    rules.extend(DocumentSlot::ALL.map(|slot| Rule::Document {
        field: Document(slot),
        mandatory: slot.is_mandatory(),
    }));

    rules
}

/// The registration form rule table.
pub fn registration_rules() -> Vec<Rule<RegistrationField>> {
    use RegistrationField::*;

    vec![
        Rule::Required(Name),
        Rule::MinDigits {
            field: PhoneNumber,
            min: admission_types::PHONE_NUMBER_DIGITS,
        },
        Rule::Email(Email),
        Rule::Required(Password),
        Rule::Confirms {
            field: ConfirmPassword,
            original: Password,
        },
        Rule::Required(StudentType),
        Rule::OneOf {
            field: StudentType,
            options: STUDENT_TYPES,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FormDraft;

    #[test]
    fn conditional_fields_follow_their_discriminant() {
        let mut draft = FormDraft::new();
        assert!(!is_visible(&draft, FieldPath::MarriedCeremony));
        assert!(!is_visible(&draft, FieldPath::DegreeDesiredDegree));
        assert!(!is_visible(
            &draft,
            FieldPath::Document(DocumentSlot::MarriageCertificate)
        ));
        assert!(is_visible(&draft, FieldPath::NameFamily));

        draft.set_text(FieldPath::MarriedIsMarried, "yes").unwrap();
        draft.set_text(FieldPath::DegreeStatus, "degree").unwrap();
        draft.set_text(FieldPath::CivilStatus, "married").unwrap();
        assert!(is_visible(&draft, FieldPath::MarriedCeremony));
        assert!(is_visible(&draft, FieldPath::DegreeDesiredDegree));
        assert!(is_visible(
            &draft,
            FieldPath::Document(DocumentSlot::MarriageCertificate)
        ));

        draft.set_text(FieldPath::DegreeStatus, "auditor").unwrap();
        assert!(!is_visible(&draft, FieldPath::DegreeDesiredDegree));
    }

    #[test]
    fn every_conditional_rule_has_a_matching_visibility_condition() {
        for rule in admission_rules() {
            if let Rule::RequiredWhen { field, when } = rule {
                let shown = conditional_fields()
                    .into_iter()
                    .find(|(f, _)| *f == field)
                    .map(|(_, c)| c);
                assert_eq!(shown, Some(when), "{field}");
            }
        }
    }

    #[test]
    fn every_document_slot_has_exactly_one_rule() {
        let document_rules: Vec<_> = admission_rules()
            .into_iter()
            .filter(|rule| matches!(rule, Rule::Document { .. }))
            .collect();
        assert_eq!(document_rules.len(), DocumentSlot::ALL.len());
    }

    #[test]
    fn blank_values() {
        assert!(FieldValue::Text("  ").is_blank());
        assert!(!FieldValue::Text("x").is_blank());
        assert!(FieldValue::List(0).is_blank());
        assert!(FieldValue::Date(false).is_blank());
        assert!(FieldValue::Attachment(None).is_blank());
    }
}
