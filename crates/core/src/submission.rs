//! Submission pipeline: upload documents, then persist the admission record.
//!
//! Steps run strictly in order and the first failure aborts the rest. The admission
//! record is only created after every upload has succeeded, so a failed submission
//! never leaves a partial admission behind. Blobs uploaded before a failure are not
//! removed. Submissions for the same applicant are serialised, so concurrent requests
//! cannot both pass the one-application check.

use crate::backend::{BlobStore, DocumentStore};
use crate::constants::ADMISSIONS_COLLECTION;
use crate::record::{to_data, Admission, AdmissionForm, AdmissionRecord, AdmissionStatus, StatusValue};
use crate::schema::{DocumentSlot, DocumentUrls};
use crate::session::SessionContext;
use crate::validation::ValidatedForm;
use crate::{AdmissionError, AdmissionResult};
use admission_files::BlobPath;
use chrono::{NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub admission_id: String,
    pub documents: DocumentUrls,
}

#[derive(Clone)]
pub struct SubmissionPipeline {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    in_flight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

/// Midnight UTC of `date`, in epoch milliseconds.
pub fn date_to_epoch_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

impl SubmissionPipeline {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            blobs,
            in_flight: Arc::default(),
        }
    }

    async fn applicant_gate(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.in_flight
            .lock()
            .await
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    pub async fn submit(
        &self,
        session: &SessionContext,
        form: ValidatedForm,
    ) -> AdmissionResult<SubmissionReceipt> {
        let user_id = session.user_id();
        let gate = self.applicant_gate(user_id).await;
        let _serialised = gate.lock().await;

        if Admission::find_for_user(self.store.as_ref(), user_id)
            .await?
            .is_some()
        {
            return Err(AdmissionError::AlreadyApplied);
        }

        let (details, date_of_birth, attachments) = form.into_parts();

        let mut documents = DocumentUrls::default();
        for slot in DocumentSlot::ALL {
            let Some(attachment) = attachments.get(slot) else {
                continue;
            };
            let path = BlobPath::for_upload(
                &slot.storage_folder(),
                &attachment.filename,
                &attachment.bytes,
            )?;
            self.blobs.put(&path, &attachment.bytes).await?;
            tracing::debug!(user = %user_id, slot = slot.key(), path = %path.as_str(), "document uploaded");
            documents.set(slot, self.blobs.resolve(&path));
        }

        let record = AdmissionRecord {
            status: StatusValue::Known(AdmissionStatus::ForReview),
            user_id: user_id.to_string(),
            created_at: Utc::now().timestamp_millis(),
            form: AdmissionForm {
                details,
                date_of_birth: date_to_epoch_millis(date_of_birth),
                documents: documents.clone(),
            },
            examination: None,
        };
        let admission_id = self
            .store
            .create(ADMISSIONS_COLLECTION, to_data(&record)?)
            .await?;

        tracing::info!(user = %user_id, admission = %admission_id, "admission submitted");
        Ok(SubmissionReceipt {
            admission_id,
            documents,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendResult, LocalDocumentStore, Query};
    use crate::schema::{png, FieldPath, FormDraft};
    use crate::session::tests::{boundary, signed_in};
    use crate::steps::{AdmissionWizard, WizardOutcome};
    use crate::validation::{tests::complete_draft, validate_form};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Records uploads in memory; optionally fails on one slot's folder or yields on
    /// every upload.
    #[derive(Default)]
    pub(crate) struct RecordingBlobs {
        pub(crate) uploads: StdMutex<Vec<String>>,
        pub(crate) fail_on: Option<&'static str>,
        pub(crate) yield_on_put: bool,
    }

    #[async_trait]
    impl BlobStore for RecordingBlobs {
        async fn put(&self, path: &BlobPath, _bytes: &[u8]) -> BackendResult<()> {
            if self.yield_on_put {
                tokio::task::yield_now().await;
            }
            if self.fail_on.is_some_and(|folder| path.as_str().starts_with(folder)) {
                return Err(BackendError::Upload("quota exceeded".into()));
            }
            self.uploads.lock().unwrap().push(path.as_str().to_string());
            Ok(())
        }

        fn resolve(&self, path: &BlobPath) -> String {
            format!("https://blobs.test/{}", path.as_str())
        }
    }

    fn pipeline(blobs: RecordingBlobs) -> (SubmissionPipeline, Arc<LocalDocumentStore>, Arc<RecordingBlobs>) {
        let store = Arc::new(LocalDocumentStore::in_memory());
        let blobs = Arc::new(blobs);
        (
            SubmissionPipeline::new(store.clone(), blobs.clone()),
            store,
            blobs,
        )
    }

    #[test]
    fn dates_become_midnight_utc_millis() {
        let date = NaiveDate::from_ymd_opt(1995, 3, 14).unwrap();
        assert_eq!(date_to_epoch_millis(date), 795_139_200_000);
    }

    #[tokio::test]
    async fn uploads_in_slot_order_then_creates_record() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let (pipeline, store, blobs) = pipeline(RecordingBlobs::default());

        let form = validate_form(&complete_draft()).unwrap();
        let receipt = pipeline.submit(&session, form).await.unwrap();

        let uploads = blobs.uploads.lock().unwrap().clone();
        let folders: Vec<&str> = uploads
            .iter()
            .map(|path| path.rsplit_once('/').map_or("", |(folder, _)| folder))
            .collect();
        assert_eq!(
            folders,
            [
                "documents/honorableDismissal",
                "documents/tor",
                "documents/generalWeightedAverage",
                "documents/birthCertificate",
                "documents/idPicture"
            ]
        );
        assert_eq!(receipt.documents.marriage_certificate, "");
        assert!(receipt.documents.tor.starts_with("https://blobs.test/documents/tor/"));

        let stored = store
            .get(ADMISSIONS_COLLECTION, &receipt.admission_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data["status"], "forReview");
        assert_eq!(stored.data["userId"], session.user_id());
        assert_eq!(stored.data["form"]["dateOfBirth"], 795_139_200_000_i64);
        assert_eq!(stored.data["form"]["documents"]["marriageCertificate"], "");
        assert_eq!(stored.data["form"]["documents"].as_object().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn unusable_filenames_are_stored_under_the_slot_name() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let (pipeline, _, _) = pipeline(RecordingBlobs::default());

        let mut draft = complete_draft();
        draft.attach(crate::schema::DocumentSlot::Tor, Some(png("写真")));
        let form = validate_form(&draft).unwrap();
        let receipt = pipeline.submit(&session, form).await.unwrap();

        assert!(receipt.documents.tor.starts_with("https://blobs.test/documents/tor/"));
        assert!(receipt.documents.tor.ends_with("-tor.png"));
    }

    #[tokio::test]
    async fn concurrent_submissions_create_one_record() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let (pipeline, store, _) = pipeline(RecordingBlobs {
            yield_on_put: true,
            ..Default::default()
        });

        let form = validate_form(&complete_draft()).unwrap();
        let (first, second) = tokio::join!(
            pipeline.submit(&session, form.clone()),
            pipeline.submit(&session, form)
        );

        let refused = [&first, &second]
            .into_iter()
            .filter(|result| matches!(result, Err(AdmissionError::AlreadyApplied)))
            .count();
        assert!(first.is_ok() || second.is_ok());
        assert_eq!(refused, 1);

        let admissions = store
            .query(&Query::collection(ADMISSIONS_COLLECTION))
            .await
            .unwrap();
        assert_eq!(admissions.len(), 1);
    }

    #[tokio::test]
    async fn upload_failure_aborts_without_a_record() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let (pipeline, store, blobs) = pipeline(RecordingBlobs {
            fail_on: Some("documents/birthCertificate"),
            ..Default::default()
        });

        let form = validate_form(&complete_draft()).unwrap();
        let err = pipeline.submit(&session, form).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Backend(BackendError::Upload(_))));

        assert_eq!(blobs.uploads.lock().unwrap().len(), 3);
        let admissions = store
            .query(&Query::collection(ADMISSIONS_COLLECTION))
            .await
            .unwrap();
        assert!(admissions.is_empty());
    }

    #[tokio::test]
    async fn second_submission_is_refused() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let (pipeline, store, _) = pipeline(RecordingBlobs::default());

        let form = validate_form(&complete_draft()).unwrap();
        pipeline.submit(&session, form.clone()).await.unwrap();
        assert!(matches!(
            pipeline.submit(&session, form).await,
            Err(AdmissionError::AlreadyApplied)
        ));

        let admissions = store
            .query(&Query::collection(ADMISSIONS_COLLECTION))
            .await
            .unwrap();
        assert_eq!(admissions.len(), 1);
    }

    #[tokio::test]
    async fn wizard_submits_from_last_step_and_resets() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let (pipeline, _, _) = pipeline(RecordingBlobs::default());

        let mut wizard = AdmissionWizard::with_draft(complete_draft());
        for _ in 0..3 {
            assert!(matches!(
                wizard.next(&pipeline, &session).await.unwrap(),
                WizardOutcome::Moved(_)
            ));
        }
        match wizard.next(&pipeline, &session).await.unwrap() {
            WizardOutcome::Submitted(receipt) => assert!(!receipt.admission_id.is_empty()),
            other => panic!("expected Submitted, got {other:?}"),
        }
        assert_eq!(wizard.draft(), &FormDraft::default());
    }

    #[tokio::test]
    async fn wizard_keeps_draft_when_pipeline_fails() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let (pipeline, _, _) = pipeline(RecordingBlobs {
            fail_on: Some("documents/tor"),
            ..Default::default()
        });

        let mut wizard = AdmissionWizard::with_draft(complete_draft());
        for _ in 0..3 {
            wizard.next(&pipeline, &session).await.unwrap();
        }
        assert!(wizard.next(&pipeline, &session).await.is_err());
        assert_eq!(wizard.draft(), &complete_draft());
        assert_eq!(wizard.current_step(), crate::steps::Step::UploadDocuments);
    }

    #[tokio::test]
    async fn wizard_records_blocking_errors() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let (pipeline, _, _) = pipeline(RecordingBlobs::default());

        let mut wizard = AdmissionWizard::new();
        wizard
            .draft_mut()
            .set_text(FieldPath::NameFamily, "Reyes")
            .unwrap();
        wizard
            .draft_mut()
            .attach(crate::schema::DocumentSlot::Tor, Some(png("tor.png")));

        assert!(matches!(
            wizard.next(&pipeline, &session).await.unwrap(),
            WizardOutcome::Blocked
        ));
        assert!(wizard.errors().get(FieldPath::NameFamily).is_none());
        assert!(wizard.errors().get(FieldPath::NameFirst).is_some());
    }
}
