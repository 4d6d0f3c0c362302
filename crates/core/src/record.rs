//! Stored record shapes.
//!
//! These structs define the document layout shared with whatever backend holds the data, so
//! field names and value encodings here are a wire contract. Timestamps are epoch
//! milliseconds. Stored documents are decoded with `serde_path_to_error` so a shape mismatch
//! names the offending field.

use crate::backend::{Document, DocumentData, DocumentStore, Query};
use crate::constants::{ADMISSIONS_COLLECTION, ADMISSION_USER_FIELD};
use crate::examination::ExamSlot;
use crate::schema::{DocumentUrls, FormDetails, StudentType};
use crate::{AdmissionError, AdmissionResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdmissionStatus {
    ForReview,
    OnGoingExamination,
    CompleteExamination,
    ApprovedExamination,
    RejectedExamination,
    Approved,
    Rejected,
}

impl AdmissionStatus {
    pub const ALL: [AdmissionStatus; 7] = [
        AdmissionStatus::ForReview,
        AdmissionStatus::OnGoingExamination,
        AdmissionStatus::CompleteExamination,
        AdmissionStatus::ApprovedExamination,
        AdmissionStatus::RejectedExamination,
        AdmissionStatus::Approved,
        AdmissionStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AdmissionStatus::ForReview => "forReview",
            AdmissionStatus::OnGoingExamination => "onGoingExamination",
            AdmissionStatus::CompleteExamination => "completeExamination",
            AdmissionStatus::ApprovedExamination => "approvedExamination",
            AdmissionStatus::RejectedExamination => "rejectedExamination",
            AdmissionStatus::Approved => "approved",
            AdmissionStatus::Rejected => "rejected",
        }
    }

    /// The review workflow. Applicants move forReview to onGoingExamination; only the
    /// mark-complete action is applicant-driven, every other edge is an administrator's.
    pub fn can_transition_to(self, next: AdmissionStatus) -> bool {
        use AdmissionStatus::*;
        matches!(
            (self, next),
            (ForReview, OnGoingExamination)
                | (ForReview, Approved)
                | (ForReview, Rejected)
                | (OnGoingExamination, CompleteExamination)
                | (CompleteExamination, ApprovedExamination)
                | (CompleteExamination, RejectedExamination)
        )
    }

    pub fn is_terminal(self) -> bool {
        AdmissionStatus::ALL
            .iter()
            .all(|next| !self.can_transition_to(*next))
    }
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored status value. Values written by other tools that this build does not know
/// are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Known(AdmissionStatus),
    Unrecognised(String),
}

impl StatusValue {
    pub fn known(&self) -> Option<AdmissionStatus> {
        match self {
            StatusValue::Known(status) => Some(*status),
            StatusValue::Unrecognised(_) => None,
        }
    }

    pub fn is(&self, status: AdmissionStatus) -> bool {
        self.known() == Some(status)
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusValue::Known(status) => status.fmt(f),
            StatusValue::Unrecognised(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionForm {
    #[serde(flatten)]
    pub details: FormDetails,
    pub date_of_birth: i64,
    pub documents: DocumentUrls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Examination {
    pub schedule_date: i64,
    #[serde(default)]
    pub exam_form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete_exam_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ss_proof: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ss_receipt: Option<String>,
}

impl Examination {
    /// The stored URL for a screenshot slot; blank values count as empty.
    pub fn screenshot(&self, slot: ExamSlot) -> Option<&str> {
        let value = match slot {
            ExamSlot::Proof => self.ss_proof.as_deref(),
            ExamSlot::Receipt => self.ss_receipt.as_deref(),
        };
        value.filter(|url| !url.trim().is_empty())
    }

    pub fn set_screenshot(&mut self, slot: ExamSlot, url: String) {
        match slot {
            ExamSlot::Proof => self.ss_proof = Some(url),
            ExamSlot::Receipt => self.ss_receipt = Some(url),
        }
    }

    /// Why the examination cannot be marked complete at `now` (epoch millis), or `None`
    /// if it can. An examination cannot be completed before its scheduled date.
    pub fn completion_blocker(&self, status: &StatusValue, now: i64) -> Option<String> {
        if self.screenshot(ExamSlot::Proof).is_none() {
            return Some("the examination proof screenshot has not been uploaded".into());
        }
        if self.screenshot(ExamSlot::Receipt).is_none() {
            return Some("the payment receipt has not been uploaded".into());
        }
        if !status.is(AdmissionStatus::OnGoingExamination) {
            return Some(format!("admission status is '{status}'"));
        }
        if now < self.schedule_date {
            return Some("the examination has not taken place yet".into());
        }
        None
    }

    pub fn exam_form_id(&self) -> Option<&str> {
        Some(self.exam_form.as_str()).filter(|id| !id.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRecord {
    pub status: StatusValue,
    pub user_id: String,
    pub created_at: i64,
    pub form: AdmissionForm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examination: Option<Examination>,
}

/// An admission record together with its document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub id: String,
    pub record: AdmissionRecord,
}

impl Admission {
    pub fn from_document(document: &Document) -> AdmissionResult<Self> {
        Ok(Self {
            id: document.id.clone(),
            record: from_data(&document.data)?,
        })
    }

    /// Loads the applicant's admission, if any. When several exist the first by id wins.
    pub async fn find_for_user(
        store: &dyn DocumentStore,
        user_id: &str,
    ) -> AdmissionResult<Option<Admission>> {
        let query = Query::collection(ADMISSIONS_COLLECTION).where_eq(ADMISSION_USER_FIELD, user_id);
        let documents = store.query(&query).await?;
        documents
            .first()
            .map(Admission::from_document)
            .transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExaminationForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Profile document at `users/<uid>`. The password is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(rename = "type")]
    pub student_type: StudentType,
    /// Kept as a string so unknown roles still decode and are refused by the role gate.
    pub role: String,
    pub created_at: i64,
    pub is_active: bool,
}

/// Decodes stored document data into `T`, naming the failing path on mismatch.
pub fn from_data<T: DeserializeOwned>(data: &DocumentData) -> AdmissionResult<T> {
    let value = serde_json::Value::Object(data.clone());
    serde_path_to_error::deserialize(value).map_err(|err| AdmissionError::RecordShape {
        path: err.path().to_string(),
        message: err.inner().to_string(),
    })
}

/// Encodes `value` as top-level document data.
pub fn to_data<T: Serialize>(value: &T) -> AdmissionResult<DocumentData> {
    match serde_json::to_value(value).map_err(AdmissionError::Serialization)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(AdmissionError::InvalidInput(format!(
            "record must serialize to an object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transition_table_matches_the_review_workflow() {
        use AdmissionStatus::*;
        assert!(ForReview.can_transition_to(OnGoingExamination));
        assert!(OnGoingExamination.can_transition_to(CompleteExamination));
        assert!(CompleteExamination.can_transition_to(ApprovedExamination));
        assert!(!OnGoingExamination.can_transition_to(Approved));
        assert!(!ForReview.can_transition_to(CompleteExamination));

        let terminal: Vec<_> = AdmissionStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            [ApprovedExamination, RejectedExamination, Approved, Rejected]
        );
    }

    #[test]
    fn unknown_status_decodes_as_unrecognised() {
        let known: StatusValue = serde_json::from_value(json!("onGoingExamination")).unwrap();
        assert_eq!(known, StatusValue::Known(AdmissionStatus::OnGoingExamination));

        let unknown: StatusValue = serde_json::from_value(json!("archived")).unwrap();
        assert_eq!(unknown, StatusValue::Unrecognised("archived".into()));
        assert_eq!(serde_json::to_value(&unknown).unwrap(), json!("archived"));
    }

    fn stored_admission() -> serde_json::Value {
        json!({
            "status": "onGoingExamination",
            "userId": "u1",
            "createdAt": 1_700_000_000_000_i64,
            "form": {
                "name": { "family": "Dela Cruz", "first": "Juan", "middle": "Santos" },
                "married": { "isMarried": "yes", "ceremony": ["civil"] },
                "degree": { "status": "degree", "desiredDegree": "MAEd" },
                "dateOfBirth": 795_139_200_000_i64,
                "documents": { "tor": "http://x/files/documents/tor/a-tor.png", "marriageCertificate": "" }
            },
            "examination": { "scheduleDate": 1_700_100_000_000_i64, "examForm": "e1", "ssProof": "" }
        })
    }

    #[test]
    fn stored_admission_decodes_with_defaults() {
        let data = stored_admission().as_object().cloned().unwrap();
        let record: AdmissionRecord = from_data(&data).unwrap();

        assert!(record.status.is(AdmissionStatus::OnGoingExamination));
        assert_eq!(record.form.details.name.family, "Dela Cruz");
        assert_eq!(record.form.documents.marriage_certificate, "");
        let exam = record.examination.unwrap();
        assert_eq!(exam.exam_form_id(), Some("e1"));
        assert_eq!(exam.screenshot(ExamSlot::Proof), None);
    }

    #[test]
    fn shape_errors_name_the_field() {
        let mut value = stored_admission();
        value["form"]["dateOfBirth"] = json!("yesterday");
        let data = value.as_object().cloned().unwrap();

        match from_data::<AdmissionRecord>(&data) {
            Err(AdmissionError::RecordShape { path, .. }) => {
                assert_eq!(path, "form.dateOfBirth");
            }
            other => panic!("expected RecordShape, got {other:?}"),
        }
    }

    #[test]
    fn record_encodes_with_wire_names() {
        let data = stored_admission().as_object().cloned().unwrap();
        let record: AdmissionRecord = from_data(&data).unwrap();
        let encoded = to_data(&record).unwrap();

        assert_eq!(encoded["userId"], "u1");
        assert_eq!(encoded["form"]["married"]["ceremony"], json!(["civil"]));
        assert_eq!(encoded["form"]["previousEducation"]["graduate"]["year"], "");
        assert!(encoded["examination"].get("completeExamDate").is_none());
    }

    #[test]
    fn completion_blocker_requires_screenshots_status_and_a_past_schedule() {
        let mut exam = Examination {
            schedule_date: 1_000,
            exam_form: String::new(),
            complete_exam_date: None,
            ss_proof: None,
            ss_receipt: None,
        };
        let ongoing = StatusValue::Known(AdmissionStatus::OnGoingExamination);
        assert!(exam.completion_blocker(&ongoing, 2_000).is_some());

        exam.set_screenshot(ExamSlot::Proof, "p".into());
        exam.set_screenshot(ExamSlot::Receipt, "r".into());
        assert_eq!(exam.completion_blocker(&ongoing, 2_000), None);
        assert_eq!(exam.completion_blocker(&ongoing, 1_000), None);
        assert_eq!(
            exam.completion_blocker(&ongoing, 999).as_deref(),
            Some("the examination has not taken place yet")
        );
        assert!(exam
            .completion_blocker(&StatusValue::Known(AdmissionStatus::ForReview), 2_000)
            .is_some());
        assert_eq!(exam.exam_form_id(), None);
    }

    #[test]
    fn user_record_keeps_type_key() {
        let user = UserRecord {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone_number: "09171234567".into(),
            student_type: StudentType::New,
            role: "user".into(),
            created_at: 1,
            is_active: true,
        };
        let data = to_data(&user).unwrap();
        assert_eq!(data["type"], "new");
        assert_eq!(data["phoneNumber"], "09171234567");
        assert!(!data.contains_key("password"));
    }
}
