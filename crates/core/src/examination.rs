//! Applicant-side examination actions: screenshot uploads and marking the exam complete.

use crate::backend::{BlobStore, DocumentData, DocumentStore};
use crate::constants::{ADMISSIONS_COLLECTION, SCREENSHOTS_FOLDER};
use crate::record::{Admission, AdmissionStatus, Examination};
use crate::schema::Attachment;
use crate::session::SessionContext;
use crate::{AdmissionError, AdmissionResult};
use admission_files::BlobPath;
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A screenshot slot on the examination sub-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExamSlot {
    Proof,
    Receipt,
}

impl ExamSlot {
    pub fn field(self) -> &'static str {
        match self {
            ExamSlot::Proof => "ssProof",
            ExamSlot::Receipt => "ssReceipt",
        }
    }
}

impl fmt::Display for ExamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExamSlot::Proof => "proof",
            ExamSlot::Receipt => "receipt",
        })
    }
}

#[derive(Clone)]
pub struct ExaminationService {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
}

impl ExaminationService {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    async fn load(&self, session: &SessionContext) -> AdmissionResult<(Admission, Examination)> {
        let admission = Admission::find_for_user(self.store.as_ref(), session.user_id())
            .await?
            .ok_or(AdmissionError::NoAdmission)?;
        let examination = admission
            .record
            .examination
            .clone()
            .ok_or(AdmissionError::NoExamination)?;
        Ok((admission, examination))
    }

    async fn write(
        &self,
        admission_id: &str,
        examination: &Examination,
        status: Option<AdmissionStatus>,
    ) -> AdmissionResult<()> {
        let mut patch = DocumentData::new();
        patch.insert(
            "examination".into(),
            serde_json::to_value(examination).map_err(AdmissionError::Serialization)?,
        );
        if let Some(status) = status {
            patch.insert("status".into(), status.as_str().into());
        }
        self.store
            .update(ADMISSIONS_COLLECTION, admission_id, patch)
            .await?;
        Ok(())
    }

    /// Uploads a screenshot to an empty slot and returns its URL.
    ///
    /// The examination object is re-read right before the write and merged, so the other
    /// slot and the schedule are preserved.
    pub async fn upload_screenshot(
        &self,
        session: &SessionContext,
        slot: ExamSlot,
        attachment: Attachment,
    ) -> AdmissionResult<String> {
        let (_, examination) = self.load(session).await?;
        if examination.screenshot(slot).is_some() {
            return Err(AdmissionError::SlotAlreadyFilled(slot));
        }
        attachment
            .check()
            .map_err(|kind| AdmissionError::InvalidInput(kind.to_string()))?;

        let path = BlobPath::for_upload(SCREENSHOTS_FOLDER, &attachment.filename, &attachment.bytes)?;
        self.blobs.put(&path, &attachment.bytes).await?;
        let url = self.blobs.resolve(&path);

        let (admission, mut latest) = self.load(session).await?;
        if latest.screenshot(slot).is_some() {
            return Err(AdmissionError::SlotAlreadyFilled(slot));
        }
        latest.set_screenshot(slot, url.clone());
        self.write(&admission.id, &latest, None).await?;

        tracing::info!(user = %session.user_id(), slot = slot.field(), "examination screenshot uploaded");
        Ok(url)
    }

    /// Marks the examination complete and returns the completion time in epoch millis.
    pub async fn mark_complete(&self, session: &SessionContext) -> AdmissionResult<i64> {
        let (admission, mut examination) = self.load(session).await?;
        let completed_at = Utc::now().timestamp_millis();
        let blocker = examination.completion_blocker(&admission.record.status, completed_at);
        if let Some(reason) = blocker {
            return Err(AdmissionError::NotReadyToComplete(reason));
        }

        examination.complete_exam_date = Some(completed_at);
        self.write(
            &admission.id,
            &examination,
            Some(AdmissionStatus::CompleteExamination),
        )
        .await?;

        tracing::info!(user = %session.user_id(), admission = %admission.id, "examination marked complete");
        Ok(completed_at)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::LocalDocumentStore;
    use crate::record::{from_data, AdmissionRecord};
    use crate::schema::png;
    use crate::session::tests::{boundary, signed_in};
    use crate::submission::tests::RecordingBlobs;
    use crate::submission::SubmissionPipeline;
    use crate::validation::{tests::complete_draft, validate_form};
    use serde_json::json;

    pub(crate) const SCHEDULE_DATE: i64 = 1_700_000_000_000;

    pub(crate) async fn schedule_exam(store: &LocalDocumentStore, admission_id: &str) {
        schedule_exam_at(store, admission_id, SCHEDULE_DATE).await;
    }

    async fn schedule_exam_at(store: &LocalDocumentStore, admission_id: &str, schedule_date: i64) {
        let mut patch = DocumentData::new();
        patch.insert("status".into(), "onGoingExamination".into());
        patch.insert(
            "examination".into(),
            json!({ "scheduleDate": schedule_date, "examForm": "" }),
        );
        store
            .update(ADMISSIONS_COLLECTION, admission_id, patch)
            .await
            .unwrap();
    }

    struct Fixture {
        store: Arc<LocalDocumentStore>,
        service: ExaminationService,
        session: SessionContext,
        admission_id: String,
    }

    async fn fixture() -> Fixture {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let store = Arc::new(LocalDocumentStore::in_memory());
        let blobs = Arc::new(RecordingBlobs::default());
        let receipt = SubmissionPipeline::new(store.clone(), blobs.clone())
            .submit(&session, validate_form(&complete_draft()).unwrap())
            .await
            .unwrap();
        Fixture {
            service: ExaminationService::new(store.clone(), blobs),
            store,
            session,
            admission_id: receipt.admission_id,
        }
    }

    async fn stored(fixture: &Fixture) -> AdmissionRecord {
        let document = fixture
            .store
            .get(ADMISSIONS_COLLECTION, &fixture.admission_id)
            .await
            .unwrap()
            .unwrap();
        from_data(&document.data).unwrap()
    }

    #[tokio::test]
    async fn upload_requires_a_scheduled_examination() {
        let fixture = fixture().await;
        let err = fixture
            .service
            .upload_screenshot(&fixture.session, ExamSlot::Proof, png("proof.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::NoExamination));
    }

    #[tokio::test]
    async fn uploads_fill_slots_and_keep_the_schedule() {
        let fixture = fixture().await;
        schedule_exam(&fixture.store, &fixture.admission_id).await;

        let proof = fixture
            .service
            .upload_screenshot(&fixture.session, ExamSlot::Proof, png("proof.png"))
            .await
            .unwrap();
        assert!(proof.contains("/screenshots/"));
        fixture
            .service
            .upload_screenshot(&fixture.session, ExamSlot::Receipt, png("receipt.png"))
            .await
            .unwrap();

        let exam = stored(&fixture).await.examination.unwrap();
        assert_eq!(exam.schedule_date, SCHEDULE_DATE);
        assert_eq!(exam.ss_proof.as_deref(), Some(proof.as_str()));
        assert!(exam.ss_receipt.is_some());

        let again = fixture
            .service
            .upload_screenshot(&fixture.session, ExamSlot::Proof, png("proof2.png"))
            .await;
        assert!(matches!(
            again,
            Err(AdmissionError::SlotAlreadyFilled(ExamSlot::Proof))
        ));
    }

    #[tokio::test]
    async fn mark_complete_needs_both_screenshots() {
        let fixture = fixture().await;
        schedule_exam(&fixture.store, &fixture.admission_id).await;
        fixture
            .service
            .upload_screenshot(&fixture.session, ExamSlot::Proof, png("proof.png"))
            .await
            .unwrap();

        let err = fixture.service.mark_complete(&fixture.session).await.unwrap_err();
        assert!(matches!(err, AdmissionError::NotReadyToComplete(_)));
        assert!(stored(&fixture).await.status.is(AdmissionStatus::OnGoingExamination));
    }

    #[tokio::test]
    async fn mark_complete_sets_status_and_date() {
        let fixture = fixture().await;
        schedule_exam(&fixture.store, &fixture.admission_id).await;
        for (slot, name) in [(ExamSlot::Proof, "p.png"), (ExamSlot::Receipt, "r.png")] {
            fixture
                .service
                .upload_screenshot(&fixture.session, slot, png(name))
                .await
                .unwrap();
        }

        let completed_at = fixture.service.mark_complete(&fixture.session).await.unwrap();

        let record = stored(&fixture).await;
        assert!(record.status.is(AdmissionStatus::CompleteExamination));
        let exam = record.examination.unwrap();
        assert_eq!(exam.complete_exam_date, Some(completed_at));
        assert!(completed_at > exam.schedule_date);
        assert!(exam.ss_proof.is_some() && exam.ss_receipt.is_some());

        assert!(matches!(
            fixture.service.mark_complete(&fixture.session).await,
            Err(AdmissionError::NotReadyToComplete(_))
        ));
    }

    #[tokio::test]
    async fn mark_complete_waits_for_the_scheduled_date() {
        let fixture = fixture().await;
        let next_month = Utc::now().timestamp_millis() + 30 * 24 * 60 * 60 * 1000;
        schedule_exam_at(&fixture.store, &fixture.admission_id, next_month).await;
        for (slot, name) in [(ExamSlot::Proof, "p.png"), (ExamSlot::Receipt, "r.png")] {
            fixture
                .service
                .upload_screenshot(&fixture.session, slot, png(name))
                .await
                .unwrap();
        }

        match fixture.service.mark_complete(&fixture.session).await {
            Err(AdmissionError::NotReadyToComplete(reason)) => {
                assert_eq!(reason, "the examination has not taken place yet");
            }
            other => panic!("expected NotReadyToComplete, got {other:?}"),
        }
        let record = stored(&fixture).await;
        assert!(record.status.is(AdmissionStatus::OnGoingExamination));
        assert_eq!(record.examination.unwrap().complete_exam_date, None);
    }

    #[tokio::test]
    async fn actions_without_an_admission_fail() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ben@example.com").await;
        let service = ExaminationService::new(
            Arc::new(LocalDocumentStore::in_memory()),
            Arc::new(RecordingBlobs::default()),
        );
        assert!(matches!(
            service.mark_complete(&session).await,
            Err(AdmissionError::NoAdmission)
        ));
    }
}
