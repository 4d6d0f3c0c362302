//! Projection of an admission record into what the applicant dashboard shows.

use crate::constants::ADMISSION_FORM_LINK;
use crate::examination::ExamSlot;
use crate::record::{Admission, AdmissionStatus, ExaminationForm, StatusValue};
use crate::schema::{degree_status_label, DocumentSlot};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BadgeVariant {
    Review,
    OnGoing,
    Complete,
    Default,
    Destructive,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub variant: BadgeVariant,
}

impl Badge {
    pub fn for_status(status: &StatusValue) -> Badge {
        match status {
            StatusValue::Known(known) => Badge::for_known(*known),
            StatusValue::Unrecognised(_) => Badge {
                label: "Unknown Status",
                variant: BadgeVariant::Unknown,
            },
        }
    }

    pub fn for_known(status: AdmissionStatus) -> Badge {
        let (label, variant) = match status {
            AdmissionStatus::ForReview => ("For Review", BadgeVariant::Review),
            AdmissionStatus::Rejected => ("Rejected", BadgeVariant::Destructive),
            AdmissionStatus::OnGoingExamination => ("Schedule of Examination", BadgeVariant::OnGoing),
            AdmissionStatus::ApprovedExamination => ("Approved Examination", BadgeVariant::Default),
            AdmissionStatus::RejectedExamination => {
                ("Rejected Examination", BadgeVariant::Destructive)
            }
            AdmissionStatus::CompleteExamination => ("Exam Complete", BadgeVariant::Complete),
            AdmissionStatus::Approved => ("Approved", BadgeVariant::Default),
        };
        Badge { label, variant }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLink {
    pub slot: DocumentSlot,
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExaminationPanel {
    pub schedule_date: i64,
    pub form_link: Option<String>,
    pub proof_url: Option<String>,
    pub receipt_url: Option<String>,
    pub completed_at: Option<i64>,
    pub can_upload_proof: bool,
    pub can_upload_receipt: bool,
    pub can_mark_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionPanel {
    pub admission_id: String,
    pub status: StatusValue,
    pub badge: Badge,
    pub applicant_name: String,
    pub submitted_at: i64,
    pub degree: String,
    pub desired_degree: Option<String>,
    pub documents: Vec<DocumentLink>,
    /// `None` while no examination is scheduled.
    pub examination: Option<ExaminationPanel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DashboardView {
    Loading,
    #[serde(rename_all = "camelCase")]
    NoAdmission { form_link: String },
    Admission(Box<AdmissionPanel>),
}

impl DashboardView {
    pub fn is_loading(&self) -> bool {
        matches!(self, DashboardView::Loading)
    }
}

/// Projects the applicant's admission and its linked examination form as of `now`
/// (epoch millis).
pub fn project(
    admission: Option<&Admission>,
    exam_form: Option<&ExaminationForm>,
    now: i64,
) -> DashboardView {
    let Some(admission) = admission else {
        return DashboardView::NoAdmission {
            form_link: ADMISSION_FORM_LINK.to_string(),
        };
    };
    let record = &admission.record;
    let form = &record.form;
    let name = &form.details.name;

    let documents = DocumentSlot::ALL
        .into_iter()
        .filter_map(|slot| {
            let url = form.documents.get(slot);
            (!url.is_empty()).then(|| DocumentLink {
                slot,
                label: slot.label(),
                url: url.to_string(),
            })
        })
        .collect();

    let examination = record.examination.as_ref().map(|exam| {
        let proof = exam.screenshot(ExamSlot::Proof);
        let receipt = exam.screenshot(ExamSlot::Receipt);
        ExaminationPanel {
            schedule_date: exam.schedule_date,
            form_link: exam_form.and_then(|f| f.link.clone()),
            proof_url: proof.map(str::to_string),
            receipt_url: receipt.map(str::to_string),
            completed_at: exam.complete_exam_date,
            can_upload_proof: proof.is_none(),
            can_upload_receipt: receipt.is_none(),
            can_mark_complete: exam.completion_blocker(&record.status, now).is_none(),
        }
    });

    let desired_degree = Some(form.details.degree.desired_degree.clone())
        .filter(|degree| !degree.trim().is_empty());

    DashboardView::Admission(Box::new(AdmissionPanel {
        admission_id: admission.id.clone(),
        status: record.status.clone(),
        badge: Badge::for_status(&record.status),
        applicant_name: [name.first.as_str(), name.middle.as_str(), name.family.as_str()]
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        submitted_at: record.created_at,
        degree: degree_status_label(&form.details.degree.status),
        desired_degree,
        documents,
        examination,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AdmissionForm, AdmissionRecord, Examination};
    use crate::schema::{DocumentUrls, FormDetails};

    fn admission(status: StatusValue, examination: Option<Examination>) -> Admission {
        let mut details = FormDetails::default();
        details.name.first = "Juan".into();
        details.name.family = "Dela Cruz".into();
        details.degree.status = "nonDegree".into();
        let mut documents = DocumentUrls::default();
        documents.tor = "https://x/tor.png".into();

        Admission {
            id: "a1".into(),
            record: AdmissionRecord {
                status,
                user_id: "u1".into(),
                created_at: 1,
                form: AdmissionForm {
                    details,
                    date_of_birth: 0,
                    documents,
                },
                examination,
            },
        }
    }

    const NOW: i64 = 1_000;

    fn exam(proof: Option<&str>, receipt: Option<&str>) -> Examination {
        Examination {
            schedule_date: 42,
            exam_form: "e1".into(),
            complete_exam_date: None,
            ss_proof: proof.map(String::from),
            ss_receipt: receipt.map(String::from),
        }
    }

    fn panel(view: DashboardView) -> AdmissionPanel {
        match view {
            DashboardView::Admission(panel) => *panel,
            other => panic!("expected Admission, got {other:?}"),
        }
    }

    #[test]
    fn badges_for_every_status() {
        let labels: Vec<_> = AdmissionStatus::ALL
            .into_iter()
            .map(|s| Badge::for_known(s).label)
            .collect();
        assert_eq!(
            labels,
            [
                "For Review",
                "Schedule of Examination",
                "Exam Complete",
                "Approved Examination",
                "Rejected Examination",
                "Approved",
                "Rejected"
            ]
        );
        assert_eq!(
            Badge::for_known(AdmissionStatus::Rejected).variant,
            BadgeVariant::Destructive
        );
        assert_eq!(
            Badge::for_status(&StatusValue::Unrecognised("archived".into())).label,
            "Unknown Status"
        );
    }

    #[test]
    fn no_admission_links_to_the_form() {
        assert_eq!(
            project(None, None, NOW),
            DashboardView::NoAdmission {
                form_link: "/admission/form".into()
            }
        );
    }

    #[test]
    fn summary_lists_uploaded_documents_and_degree_label() {
        let panel = panel(project(
            Some(&admission(StatusValue::Known(AdmissionStatus::ForReview), None)),
            None,
            NOW,
        ));
        assert_eq!(panel.applicant_name, "Juan Dela Cruz");
        assert_eq!(panel.degree, "Non-degree");
        assert_eq!(panel.desired_degree, None);
        assert_eq!(panel.documents.len(), 1);
        assert_eq!(panel.documents[0].label, "Transcript of Records");
        assert_eq!(panel.examination, None);
    }

    #[test]
    fn examination_panel_actions_follow_slots_and_status() {
        let ongoing = StatusValue::Known(AdmissionStatus::OnGoingExamination);
        let form = ExaminationForm {
            link: Some("https://forms.example/exam".into()),
        };

        let empty = panel(project(
            Some(&admission(ongoing.clone(), Some(exam(None, None)))),
            Some(&form),
            NOW,
        ))
            .examination
            .unwrap();
        assert!(empty.can_upload_proof && empty.can_upload_receipt);
        assert!(!empty.can_mark_complete);
        assert_eq!(empty.form_link.as_deref(), Some("https://forms.example/exam"));

        let ready = panel(project(
            Some(&admission(ongoing.clone(), Some(exam(Some("p"), Some("r"))))),
            None,
            NOW,
        ))
        .examination
        .unwrap();
        assert!(!ready.can_upload_proof && !ready.can_upload_receipt);
        assert!(ready.can_mark_complete);

        let early = panel(project(
            Some(&admission(ongoing, Some(exam(Some("p"), Some("r"))))),
            None,
            41,
        ))
        .examination
        .unwrap();
        assert!(!early.can_mark_complete);

        let done = panel(project(
            Some(&admission(
                StatusValue::Known(AdmissionStatus::CompleteExamination),
                Some(exam(Some("p"), Some("r"))),
            )),
            None,
            NOW,
        ))
        .examination
        .unwrap();
        assert!(!done.can_mark_complete);
    }

    #[test]
    fn views_serialize_with_state_tag() {
        let json = serde_json::to_value(DashboardView::Loading).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "loading" }));

        let json = serde_json::to_value(project(None, None, NOW)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "state": "noAdmission", "formLink": "/admission/form" })
        );
    }
}
