//! User-facing notifications for completed or failed actions.

use crate::examination::ExamSlot;
use crate::AdmissionError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Success,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
}

/// Actions that report their outcome with a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Register,
    SignIn,
    SubmitAdmission,
    UploadScreenshot(ExamSlot),
    MarkExamComplete,
}

impl UserAction {
    pub fn success_title(self) -> &'static str {
        match self {
            UserAction::Register => "Successfully registered",
            UserAction::SignIn => "Successfully signed in",
            UserAction::SubmitAdmission => "Successfully submitted your admission application",
            UserAction::UploadScreenshot(ExamSlot::Proof) => "Screenshot uploaded",
            UserAction::UploadScreenshot(ExamSlot::Receipt) => "Receipt uploaded",
            UserAction::MarkExamComplete => {
                "Successfully marked examination as complete. Please wait while we are reviewing your examination."
            }
        }
    }
}

impl Notification {
    pub fn success(action: UserAction) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: action.success_title().to_string(),
        }
    }

    /// A destructive notification carrying the error's own message.
    pub fn failure(error: &AdmissionError) -> Self {
        Self {
            kind: NotificationKind::Destructive,
            title: error.to_string(),
        }
    }
}
