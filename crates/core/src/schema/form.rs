//! The admission form draft and the form details shared with the stored record.

use super::documents::{Attachment, DocumentAttachments, DocumentSlot};
use super::fields::{EducationLevel, FieldPath, SchoolField};
use crate::rules::{FieldSource, FieldValue};
use crate::{AdmissionError, AdmissionResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Values accepted for `married.isMarried`, `religion.baptized` and the other yes/no fields.
pub const YES_NO: &[&str] = &["yes", "no"];

/// Values accepted for `civilStatus`.
pub const CIVIL_STATUSES: &[&str] = &["single", "married"];

/// Values accepted for `degree.status`.
pub const DEGREE_STATUSES: &[&str] = &["auditor", "nonDegree", "degree"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ceremony {
    Catholic,
    NonCatholic,
    Civil,
}

impl Ceremony {
    pub const ALL: [Ceremony; 3] = [Ceremony::Catholic, Ceremony::NonCatholic, Ceremony::Civil];

    pub fn label(self) -> &'static str {
        match self {
            Ceremony::Catholic => "Catholic",
            Ceremony::NonCatholic => "Non-Catholic",
            Ceremony::Civil => "Civil",
        }
    }
}

/// Display label for a degree status: `nonDegree` reads "Non-degree", others are capitalised.
pub fn degree_status_label(status: &str) -> String {
    if status == "nonDegree" {
        return "Non-degree".into();
    }
    let mut chars = status.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullName {
    pub family: String,
    pub first: String,
    pub middle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermanentAddress {
    pub town: String,
    pub province: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Religion {
    pub name: String,
    pub baptized: String,
    pub confirmed: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Married {
    pub is_married: String,
    pub ceremony: Vec<Ceremony>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct School {
    pub name: String,
    pub town: String,
    pub province: String,
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviousEducation {
    pub elementary: School,
    pub secondary: School,
    pub collegiate: School,
    pub graduate: School,
}

impl PreviousEducation {
    pub fn school(&self, level: EducationLevel) -> &School {
        match level {
            EducationLevel::Elementary => &self.elementary,
            EducationLevel::Secondary => &self.secondary,
            EducationLevel::Collegiate => &self.collegiate,
            EducationLevel::Graduate => &self.graduate,
        }
    }

    fn school_mut(&mut self, level: EducationLevel) -> &mut School {
        match level {
            EducationLevel::Elementary => &mut self.elementary,
            EducationLevel::Secondary => &mut self.secondary,
            EducationLevel::Collegiate => &mut self.collegiate,
            EducationLevel::Graduate => &mut self.graduate,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Degree {
    pub status: String,
    pub desired_degree: String,
}

/// A character reference. Both parts are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Applicant-entered details, persisted as-is inside the admission record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormDetails {
    pub name: FullName,
    pub permanent_address: PermanentAddress,
    pub civil_status: String,
    pub place_of_birth: String,
    pub religion: Religion,
    pub married: Married,
    pub previous_education: PreviousEducation,
    pub academic_honors: String,
    pub extra_curricular_activities: String,
    pub member_in_professional_org: String,
    pub under_graduate_grade: String,
    pub grade_in_major_subjects: String,
    pub degree: Degree,
    pub major_field_units: String,
    pub minor_field_units: String,
    pub is_full_time_student: String,
    pub present_position: String,
    pub subject_taught: String,
    pub references: Vec<Reference>,
}

impl FormDetails {
    fn text(&self, field: FieldPath) -> Option<&str> {
        let value = match field {
            FieldPath::NameFamily => &self.name.family,
            FieldPath::NameFirst => &self.name.first,
            FieldPath::NameMiddle => &self.name.middle,
            FieldPath::PermanentAddressTown => &self.permanent_address.town,
            FieldPath::PermanentAddressProvince => &self.permanent_address.province,
            FieldPath::CivilStatus => &self.civil_status,
            FieldPath::PlaceOfBirth => &self.place_of_birth,
            FieldPath::ReligionName => &self.religion.name,
            FieldPath::ReligionBaptized => &self.religion.baptized,
            FieldPath::ReligionConfirmed => &self.religion.confirmed,
            FieldPath::MarriedIsMarried => &self.married.is_married,
            FieldPath::PreviousEducation(level, part) => {
                let school = self.previous_education.school(level);
                match part {
                    SchoolField::Name => &school.name,
                    SchoolField::Town => &school.town,
                    SchoolField::Province => &school.province,
                    SchoolField::Year => &school.year,
                }
            }
            FieldPath::AcademicHonors => &self.academic_honors,
            FieldPath::ExtraCurricularActivities => &self.extra_curricular_activities,
            FieldPath::MemberInProfessionalOrg => &self.member_in_professional_org,
            FieldPath::UnderGraduateGrade => &self.under_graduate_grade,
            FieldPath::GradeInMajorSubjects => &self.grade_in_major_subjects,
            FieldPath::DegreeStatus => &self.degree.status,
            FieldPath::DegreeDesiredDegree => &self.degree.desired_degree,
            FieldPath::MajorFieldUnits => &self.major_field_units,
            FieldPath::MinorFieldUnits => &self.minor_field_units,
            FieldPath::IsFullTimeStudent => &self.is_full_time_student,
            FieldPath::PresentPosition => &self.present_position,
            FieldPath::SubjectTaught => &self.subject_taught,
            FieldPath::DateOfBirth
            | FieldPath::MarriedCeremony
            | FieldPath::References
            | FieldPath::Document(_) => return None,
        };
        Some(value.as_str())
    }

    fn text_mut(&mut self, field: FieldPath) -> Option<&mut String> {
        let value = match field {
            FieldPath::NameFamily => &mut self.name.family,
            FieldPath::NameFirst => &mut self.name.first,
            FieldPath::NameMiddle => &mut self.name.middle,
            FieldPath::PermanentAddressTown => &mut self.permanent_address.town,
            FieldPath::PermanentAddressProvince => &mut self.permanent_address.province,
            FieldPath::CivilStatus => &mut self.civil_status,
            FieldPath::PlaceOfBirth => &mut self.place_of_birth,
            FieldPath::ReligionName => &mut self.religion.name,
            FieldPath::ReligionBaptized => &mut self.religion.baptized,
            FieldPath::ReligionConfirmed => &mut self.religion.confirmed,
            FieldPath::MarriedIsMarried => &mut self.married.is_married,
            FieldPath::PreviousEducation(level, part) => {
                let school = self.previous_education.school_mut(level);
                match part {
                    SchoolField::Name => &mut school.name,
                    SchoolField::Town => &mut school.town,
                    SchoolField::Province => &mut school.province,
                    SchoolField::Year => &mut school.year,
                }
            }
            FieldPath::AcademicHonors => &mut self.academic_honors,
            FieldPath::ExtraCurricularActivities => &mut self.extra_curricular_activities,
            FieldPath::MemberInProfessionalOrg => &mut self.member_in_professional_org,
            FieldPath::UnderGraduateGrade => &mut self.under_graduate_grade,
            FieldPath::GradeInMajorSubjects => &mut self.grade_in_major_subjects,
            FieldPath::DegreeStatus => &mut self.degree.status,
            FieldPath::DegreeDesiredDegree => &mut self.degree.desired_degree,
            FieldPath::MajorFieldUnits => &mut self.major_field_units,
            FieldPath::MinorFieldUnits => &mut self.minor_field_units,
            FieldPath::IsFullTimeStudent => &mut self.is_full_time_student,
            FieldPath::PresentPosition => &mut self.present_position,
            FieldPath::SubjectTaught => &mut self.subject_taught,
            FieldPath::DateOfBirth
            | FieldPath::MarriedCeremony
            | FieldPath::References
            | FieldPath::Document(_) => return None,
        };
        Some(value)
    }
}

/// The in-progress admission form, owned by the wizard until submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    #[serde(flatten)]
    pub details: FormDetails,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub documents: DocumentAttachments,
}

impl FormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a text field, applying the field's input filter.
    pub fn set_text(&mut self, field: FieldPath, value: &str) -> AdmissionResult<()> {
        let filtered = field.input_filter().apply(value);
        let slot = self.details.text_mut(field).ok_or_else(|| {
            AdmissionError::InvalidInput(format!("'{field}' is not a text field"))
        })?;
        *slot = filtered;
        Ok(())
    }

    pub fn text(&self, field: FieldPath) -> Option<&str> {
        self.details.text(field)
    }

    pub fn set_date_of_birth(&mut self, date: Option<NaiveDate>) {
        self.date_of_birth = date;
    }

    /// Adds or removes a ceremony from the multi-select list. Order of first selection is kept.
    pub fn toggle_ceremony(&mut self, ceremony: Ceremony, selected: bool) {
        let list = &mut self.details.married.ceremony;
        if selected {
            if !list.contains(&ceremony) {
                list.push(ceremony);
            }
        } else {
            list.retain(|c| *c != ceremony);
        }
    }

    pub fn add_reference(&mut self, reference: Reference) {
        self.details.references.push(reference);
    }

    pub fn remove_reference(&mut self, index: usize) -> Option<Reference> {
        (index < self.details.references.len()).then(|| self.details.references.remove(index))
    }

    pub fn attach(&mut self, slot: DocumentSlot, attachment: Option<Attachment>) {
        self.documents.set(slot, attachment);
    }

    /// Re-applies every input filter. Used for drafts that arrive as JSON rather than
    /// through [`FormDraft::set_text`].
    pub fn sanitize(&mut self) {
        for field in FieldPath::all() {
            if let Some(value) = self.details.text_mut(field) {
                let filtered = field.input_filter().apply(value);
                *value = filtered;
            }
        }
    }
}

impl FieldSource<FieldPath> for FormDraft {
    fn value(&self, field: FieldPath) -> FieldValue<'_> {
        match field {
            FieldPath::DateOfBirth => FieldValue::Date(self.date_of_birth.is_some()),
            FieldPath::MarriedCeremony => FieldValue::List(self.details.married.ceremony.len()),
            FieldPath::References => FieldValue::List(self.details.references.len()),
            FieldPath::Document(slot) => FieldValue::Attachment(self.documents.get(slot)),
            other => FieldValue::Text(self.details.text(other).unwrap_or_default()),
        }
    }
}
