//! Form schema: addressable fields, document slots and the draft types rules run against.

mod documents;
mod fields;
mod form;
mod registration;

pub use documents::{
    Attachment, DocumentAttachments, DocumentSlot, DocumentUrls, ALLOWED_DOCUMENT_TYPES,
};
pub use fields::{EducationLevel, FieldPath, InputFilter, SchoolField};
pub use form::{
    degree_status_label, Ceremony, Degree, FormDetails, FormDraft, FullName, Married,
    PermanentAddress, PreviousEducation, Reference, Religion, School, CIVIL_STATUSES,
    DEGREE_STATUSES, YES_NO,
};
pub use registration::{RegistrationDraft, RegistrationField, StudentType};

#[cfg(test)]
pub(crate) use documents::tests::png;
