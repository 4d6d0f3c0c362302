//! Live dashboard projection.
//!
//! [`DashboardProjector`] subscribes to the applicant's admission and, when one carries an
//! examination, to the linked examination form. Both feeds forward into one channel owned
//! by a single task, which recomputes the [`DashboardView`] and publishes it on a watch
//! channel. Changing `examForm` re-targets the form subscription. Dropping the projector
//! stops the task, which drops both subscriptions.

use crate::backend::{Document, DocumentStore, Query, Subscription};
use crate::constants::{ADMISSIONS_COLLECTION, ADMISSION_USER_FIELD, EXAMINATIONS_COLLECTION};
use crate::record::{from_data, Admission, ExaminationForm};
use crate::session::SessionContext;
use crate::status::{project, DashboardView};
use crate::AdmissionResult;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

enum Feed {
    Admissions(Vec<Document>),
    ExamForm { id: String, documents: Vec<Document> },
}

pub struct DashboardProjector {
    view: watch::Receiver<DashboardView>,
    task: JoinHandle<()>,
}

impl DashboardProjector {
    /// Starts projecting for `session`. Must be called from within a tokio runtime.
    pub fn start(store: Arc<dyn DocumentStore>, session: &SessionContext) -> Self {
        let (view_tx, view) = watch::channel(DashboardView::Loading);
        let user_id = session.user_id().to_string();
        let task = tokio::spawn(run(store, user_id, view_tx));
        Self { view, task }
    }

    pub fn current(&self) -> DashboardView {
        self.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<DashboardView> {
        self.view.clone()
    }

    /// Waits for the first view after `Loading`.
    pub async fn settled(&mut self) -> DashboardView {
        if let Ok(view) = self.view.wait_for(|view| !view.is_loading()).await {
            return view.clone();
        }
        self.current()
    }
}

impl Drop for DashboardProjector {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn first_parsed<T: serde::de::DeserializeOwned>(documents: &[Document]) -> Option<(String, T)> {
    let document = documents.first()?;
    match from_data::<T>(&document.data) {
        Ok(value) => Some((document.id.clone(), value)),
        Err(e) => {
            tracing::warn!(id = %document.id, "ignoring malformed record: {}", e);
            None
        }
    }
}

async fn run(
    store: Arc<dyn DocumentStore>,
    user_id: String,
    view_tx: watch::Sender<DashboardView>,
) {
    let (feed_tx, mut feed) = mpsc::unbounded_channel();

    let admissions_tx = feed_tx.clone();
    let _admissions: Subscription = store.subscribe(
        Query::collection(ADMISSIONS_COLLECTION).where_eq(ADMISSION_USER_FIELD, user_id.as_str()),
        Box::new(move |documents| {
            let _ = admissions_tx.send(Feed::Admissions(documents));
        }),
    );

    let mut exam_subscription: Option<(String, Subscription)> = None;
    let mut admission: Option<Admission> = None;
    let mut exam_form: Option<ExaminationForm> = None;
    let mut settled = false;

    while let Some(event) = feed.recv().await {
        match event {
            Feed::Admissions(documents) => {
                settled = true;
                admission = first_parsed(&documents).map(|(id, record)| Admission { id, record });

                let wanted = admission
                    .as_ref()
                    .and_then(|a| a.record.examination.as_ref())
                    .and_then(|exam| exam.exam_form_id())
                    .map(str::to_string);
                let current = exam_subscription.as_ref().map(|(id, _)| id.clone());

                if wanted != current {
                    exam_subscription = None;
                    exam_form = None;
                    if let Some(id) = wanted {
                        let exam_tx = feed_tx.clone();
                        let feed_id = id.clone();
                        let subscription = store.subscribe(
                            Query::document(EXAMINATIONS_COLLECTION, id.as_str()),
                            Box::new(move |documents| {
                                let _ = exam_tx.send(Feed::ExamForm {
                                    id: feed_id.clone(),
                                    documents,
                                });
                            }),
                        );
                        exam_subscription = Some((id, subscription));
                    }
                }
            }
            Feed::ExamForm { id, documents } => {
                let still_wanted = exam_subscription
                    .as_ref()
                    .is_some_and(|(current, _)| *current == id);
                if still_wanted {
                    exam_form = first_parsed(&documents).map(|(_, form)| form);
                }
            }
        }

        if settled {
            view_tx.send_replace(project(
                admission.as_ref(),
                exam_form.as_ref(),
                Utc::now().timestamp_millis(),
            ));
        }
    }
}

/// One-shot projection without a live subscription.
pub async fn snapshot(
    store: &dyn DocumentStore,
    session: &SessionContext,
) -> AdmissionResult<DashboardView> {
    let admission = Admission::find_for_user(store, session.user_id()).await?;
    let exam_form_id = admission
        .as_ref()
        .and_then(|a| a.record.examination.as_ref())
        .and_then(|exam| exam.exam_form_id());

    let exam_form = match exam_form_id {
        Some(id) => match store.get(EXAMINATIONS_COLLECTION, id).await? {
            Some(document) => Some(from_data::<ExaminationForm>(&document.data)?),
            None => None,
        },
        None => None,
    };

    Ok(project(
        admission.as_ref(),
        exam_form.as_ref(),
        Utc::now().timestamp_millis(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DocumentData, LocalDocumentStore};
    use crate::examination::tests::schedule_exam;
    use crate::session::tests::{boundary, signed_in};
    use crate::status::AdmissionPanel;
    use crate::submission::tests::RecordingBlobs;
    use crate::submission::SubmissionPipeline;
    use crate::validation::{tests::complete_draft, validate_form};
    use serde_json::json;
    use std::time::Duration;

    async fn next_view(
        rx: &mut watch::Receiver<DashboardView>,
        predicate: impl FnMut(&DashboardView) -> bool,
    ) -> DashboardView {
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("view did not arrive in time")
            .expect("projector stopped")
            .clone()
    }

    fn panel(view: &DashboardView) -> Option<&AdmissionPanel> {
        match view {
            DashboardView::Admission(panel) => Some(panel),
            _ => None,
        }
    }

    fn exam_form(link: &str) -> DocumentData {
        json!({ "link": link }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn projects_no_admission_then_follows_submission() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let store = Arc::new(LocalDocumentStore::in_memory());

        let mut projector = DashboardProjector::start(store.clone(), &session);
        assert!(matches!(
            projector.settled().await,
            DashboardView::NoAdmission { .. }
        ));

        SubmissionPipeline::new(store.clone(), Arc::new(RecordingBlobs::default()))
            .submit(&session, validate_form(&complete_draft()).unwrap())
            .await
            .unwrap();

        let mut rx = projector.watch();
        let view = next_view(&mut rx, |view| panel(view).is_some()).await;
        assert_eq!(panel(&view).unwrap().badge.label, "For Review");
    }

    #[tokio::test]
    async fn follows_and_retargets_the_examination_form() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let store = Arc::new(LocalDocumentStore::in_memory());
        let receipt = SubmissionPipeline::new(store.clone(), Arc::new(RecordingBlobs::default()))
            .submit(&session, validate_form(&complete_draft()).unwrap())
            .await
            .unwrap();

        store
            .set(EXAMINATIONS_COLLECTION, "e1", exam_form("https://forms/one"))
            .await
            .unwrap();
        store
            .set(EXAMINATIONS_COLLECTION, "e2", exam_form("https://forms/two"))
            .await
            .unwrap();

        let projector = DashboardProjector::start(store.clone(), &session);
        let mut rx = projector.watch();

        schedule_exam(&store, &receipt.admission_id).await;
        let link_of = |view: &DashboardView| {
            panel(view)
                .and_then(|p| p.examination.as_ref())
                .and_then(|e| e.form_link.clone())
        };

        let mut patch = DocumentData::new();
        patch.insert(
            "examination".into(),
            json!({ "scheduleDate": 5, "examForm": "e1" }),
        );
        store
            .update(ADMISSIONS_COLLECTION, &receipt.admission_id, patch)
            .await
            .unwrap();
        let view = next_view(&mut rx, |view| link_of(view).is_some()).await;
        assert_eq!(link_of(&view).as_deref(), Some("https://forms/one"));

        store
            .set(EXAMINATIONS_COLLECTION, "e1", exam_form("https://forms/one-v2"))
            .await
            .unwrap();
        next_view(&mut rx, |view| link_of(view).as_deref() == Some("https://forms/one-v2")).await;

        let mut patch = DocumentData::new();
        patch.insert(
            "examination".into(),
            json!({ "scheduleDate": 5, "examForm": "e2" }),
        );
        store
            .update(ADMISSIONS_COLLECTION, &receipt.admission_id, patch)
            .await
            .unwrap();
        next_view(&mut rx, |view| link_of(view).as_deref() == Some("https://forms/two")).await;
    }

    #[tokio::test]
    async fn snapshot_matches_live_projection() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let store = Arc::new(LocalDocumentStore::in_memory());

        let view = snapshot(store.as_ref(), &session).await.unwrap();
        assert!(matches!(view, DashboardView::NoAdmission { .. }));

        let receipt = SubmissionPipeline::new(store.clone(), Arc::new(RecordingBlobs::default()))
            .submit(&session, validate_form(&complete_draft()).unwrap())
            .await
            .unwrap();
        schedule_exam(&store, &receipt.admission_id).await;

        let view = snapshot(store.as_ref(), &session).await.unwrap();
        let exam = panel(&view).unwrap().examination.clone().unwrap();
        assert!(exam.can_upload_proof);
        assert_eq!(exam.form_link, None);
    }

    #[tokio::test]
    async fn dropping_the_projector_stops_updates() {
        let (auth, _) = boundary();
        let session = signed_in(&auth, "ana@example.com").await;
        let store = Arc::new(LocalDocumentStore::in_memory());

        let mut projector = DashboardProjector::start(store.clone(), &session);
        projector.settled().await;
        let mut rx = projector.watch();
        drop(projector);

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("sender was not dropped")
            .expect_err("no view after the projector is dropped");
    }
}
