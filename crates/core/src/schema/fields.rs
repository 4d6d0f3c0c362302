//! Addressable fields of the admission form.
//!
//! Every field a rule, a step or an error can point at is a [`FieldPath`]. Its `Display`
//! rendering is the dotted path used on the wire (`previousEducation.elementary.name`).

use super::documents::DocumentSlot;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EducationLevel {
    Elementary,
    Secondary,
    Collegiate,
    Graduate,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 4] = [
        EducationLevel::Elementary,
        EducationLevel::Secondary,
        EducationLevel::Collegiate,
        EducationLevel::Graduate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            EducationLevel::Elementary => "elementary",
            EducationLevel::Secondary => "secondary",
            EducationLevel::Collegiate => "collegiate",
            EducationLevel::Graduate => "graduate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchoolField {
    Name,
    Town,
    Province,
    Year,
}

impl SchoolField {
    pub const ALL: [SchoolField; 4] = [
        SchoolField::Name,
        SchoolField::Town,
        SchoolField::Province,
        SchoolField::Year,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SchoolField::Name => "name",
            SchoolField::Town => "town",
            SchoolField::Province => "province",
            SchoolField::Year => "year",
        }
    }
}

/// Filtering applied to a text field every time it is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFilter {
    None,
    PersonName,
}

impl InputFilter {
    pub fn apply(self, input: &str) -> String {
        match self {
            InputFilter::None => input.to_string(),
            InputFilter::PersonName => admission_types::sanitize_person_name(input),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldPath {
    NameFamily,
    NameFirst,
    NameMiddle,
    PermanentAddressTown,
    PermanentAddressProvince,
    CivilStatus,
    DateOfBirth,
    PlaceOfBirth,
    ReligionName,
    ReligionBaptized,
    ReligionConfirmed,
    MarriedIsMarried,
    MarriedCeremony,
    PreviousEducation(EducationLevel, SchoolField),
    AcademicHonors,
    ExtraCurricularActivities,
    MemberInProfessionalOrg,
    UnderGraduateGrade,
    GradeInMajorSubjects,
    DegreeStatus,
    DegreeDesiredDegree,
    MajorFieldUnits,
    MinorFieldUnits,
    IsFullTimeStudent,
    PresentPosition,
    SubjectTaught,
    References,
    Document(DocumentSlot),
}

impl FieldPath {
    /// Every field of the form, in form order.
    pub fn all() -> Vec<FieldPath> {
        let mut fields = vec![
            FieldPath::NameFamily,
            FieldPath::NameFirst,
            FieldPath::NameMiddle,
            FieldPath::PermanentAddressTown,
            FieldPath::PermanentAddressProvince,
            FieldPath::CivilStatus,
            FieldPath::DateOfBirth,
            FieldPath::PlaceOfBirth,
            FieldPath::ReligionName,
            FieldPath::ReligionBaptized,
            FieldPath::ReligionConfirmed,
            FieldPath::MarriedIsMarried,
            FieldPath::MarriedCeremony,
        ];
        for level in EducationLevel::ALL {
            for field in SchoolField::ALL {
                fields.push(FieldPath::PreviousEducation(level, field));
            }
        }
        fields.extend([
            FieldPath::AcademicHonors,
            FieldPath::ExtraCurricularActivities,
            FieldPath::MemberInProfessionalOrg,
            FieldPath::UnderGraduateGrade,
            FieldPath::GradeInMajorSubjects,
            FieldPath::DegreeStatus,
            FieldPath::DegreeDesiredDegree,
            FieldPath::MajorFieldUnits,
            FieldPath::MinorFieldUnits,
            FieldPath::IsFullTimeStudent,
            FieldPath::PresentPosition,
            FieldPath::SubjectTaught,
            FieldPath::References,
        ]);
        fields.extend(DocumentSlot::ALL.map(FieldPath::Document));
        fields
    }

    /// Parses a dotted wire path back into a field.
    pub fn parse(path: &str) -> Option<FieldPath> {
        FieldPath::all()
            .into_iter()
            .find(|field| field.to_string() == path)
    }

    pub fn input_filter(self) -> InputFilter {
        match self {
            FieldPath::NameFamily | FieldPath::NameFirst | FieldPath::NameMiddle => {
                InputFilter::PersonName
            }
            _ => InputFilter::None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match self {
            FieldPath::PreviousEducation(level, field) => {
                return write!(f, "previousEducation.{}.{}", level.key(), field.key());
            }
            FieldPath::Document(slot) => return write!(f, "documents.{}", slot.key()),
            FieldPath::NameFamily => "name.family",
            FieldPath::NameFirst => "name.first",
            FieldPath::NameMiddle => "name.middle",
            FieldPath::PermanentAddressTown => "permanentAddress.town",
            FieldPath::PermanentAddressProvince => "permanentAddress.province",
            FieldPath::CivilStatus => "civilStatus",
            FieldPath::DateOfBirth => "dateOfBirth",
            FieldPath::PlaceOfBirth => "placeOfBirth",
            FieldPath::ReligionName => "religion.name",
            FieldPath::ReligionBaptized => "religion.baptized",
            FieldPath::ReligionConfirmed => "religion.confirmed",
            FieldPath::MarriedIsMarried => "married.isMarried",
            FieldPath::MarriedCeremony => "married.ceremony",
            FieldPath::AcademicHonors => "academicHonors",
            FieldPath::ExtraCurricularActivities => "extraCurricularActivities",
            FieldPath::MemberInProfessionalOrg => "memberInProfessionalOrg",
            FieldPath::UnderGraduateGrade => "underGraduateGrade",
            FieldPath::GradeInMajorSubjects => "gradeInMajorSubjects",
            FieldPath::DegreeStatus => "degree.status",
            FieldPath::DegreeDesiredDegree => "degree.desiredDegree",
            FieldPath::MajorFieldUnits => "majorFieldUnits",
            FieldPath::MinorFieldUnits => "minorFieldUnits",
            FieldPath::IsFullTimeStudent => "isFullTimeStudent",
            FieldPath::PresentPosition => "presentPosition",
            FieldPath::SubjectTaught => "subjectTaught",
            FieldPath::References => "references",
        };
        f.write_str(path)
    }
}

impl Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
