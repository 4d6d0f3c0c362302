//! Multi-step form navigation.
//!
//! The form is split into four [`Step`]s that partition the field set. Moving forward
//! validates only the current step. On the last step, moving forward validates the whole
//! form and hands the result to the submission pipeline.

use crate::rules;
use crate::schema::{FieldPath, FormDraft};
use crate::session::SessionContext;
use crate::submission::{SubmissionPipeline, SubmissionReceipt};
use crate::validation::{validate_form, validate_step, ValidatedForm, ValidationErrors};
use crate::AdmissionResult;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Profile,
    Education,
    References,
    UploadDocuments,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::Profile,
        Step::Education,
        Step::References,
        Step::UploadDocuments,
    ];

    pub fn index(self) -> usize {
        match self {
            Step::Profile => 0,
            Step::Education => 1,
            Step::References => 2,
            Step::UploadDocuments => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Step> {
        Step::ALL.get(index).copied()
    }

    /// Identifier shown in the progress bar.
    pub fn id(self) -> String {
        format!("Step {}", self.index() + 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Profile => "Profile",
            Step::Education => "Education",
            Step::References => "References",
            Step::UploadDocuments => "Upload Documents",
        }
    }

    pub fn next(self) -> Option<Step> {
        Step::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Step> {
        self.index().checked_sub(1).and_then(Step::from_index)
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    pub fn owns(self, field: FieldPath) -> bool {
        use FieldPath::*;

        let owner = match field {
            NameFamily | NameFirst | NameMiddle | PermanentAddressTown
            | PermanentAddressProvince | CivilStatus | DateOfBirth | PlaceOfBirth
            | ReligionName | ReligionBaptized | ReligionConfirmed | MarriedIsMarried
            | MarriedCeremony => Step::Profile,
            PreviousEducation(..)
            | AcademicHonors
            | ExtraCurricularActivities
            | MemberInProfessionalOrg
            | UnderGraduateGrade
            | GradeInMajorSubjects
            | DegreeStatus
            | DegreeDesiredDegree
            | MajorFieldUnits
            | MinorFieldUnits
            | IsFullTimeStudent
            | PresentPosition
            | SubjectTaught => Step::Education,
            References => Step::References,
            Document(_) => Step::UploadDocuments,
        };
        owner == self
    }

    pub fn fields(self) -> Vec<FieldPath> {
        FieldPath::all()
            .into_iter()
            .filter(|field| self.owns(*field))
            .collect()
    }
}

#[derive(Debug)]
pub enum Advance {
    Moved { from: Step, to: Step },
    Blocked(ValidationErrors<FieldPath>),
    Submit(ValidatedForm),
}

/// Tracks the current step. There is no direct jump; only forward (validated) and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepNavigator {
    current: Step,
}

impl Default for StepNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl StepNavigator {
    pub fn new() -> Self {
        Self {
            current: Step::Profile,
        }
    }

    pub fn current(&self) -> Step {
        self.current
    }

    pub fn advance(&mut self, draft: &FormDraft) -> Advance {
        if let Err(errors) = validate_step(draft, self.current) {
            return Advance::Blocked(errors);
        }
        match self.current.next() {
            Some(next) => {
                let from = self.current;
                self.current = next;
                Advance::Moved { from, to: next }
            }
            None => match validate_form(draft) {
                Ok(form) => Advance::Submit(form),
                Err(errors) => Advance::Blocked(errors),
            },
        }
    }

    /// Moves back one step without validating. Does nothing on the first step.
    pub fn back(&mut self) -> Step {
        if let Some(previous) = self.current.previous() {
            self.current = previous;
        }
        self.current
    }
}

#[derive(Debug)]
pub enum WizardOutcome {
    Moved(Step),
    Blocked,
    Submitted(SubmissionReceipt),
}

/// Owns a draft and its navigator, and drives submission from the last step.
///
/// `next` takes `&mut self`, so a wizard can have at most one submission in flight.
#[derive(Debug, Default)]
pub struct AdmissionWizard {
    draft: FormDraft,
    navigator: StepNavigator,
    errors: ValidationErrors<FieldPath>,
}

impl AdmissionWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(draft: FormDraft) -> Self {
        Self {
            draft,
            ..Self::default()
        }
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut FormDraft {
        &mut self.draft
    }

    pub fn current_step(&self) -> Step {
        self.navigator.current()
    }

    /// Errors from the last blocked attempt to move forward.
    pub fn errors(&self) -> &ValidationErrors<FieldPath> {
        &self.errors
    }

    pub fn is_visible(&self, field: FieldPath) -> bool {
        rules::is_visible(&self.draft, field)
    }

    pub fn back(&mut self) -> Step {
        self.navigator.back()
    }

    /// Moves forward, or submits from the last step.
    ///
    /// On a pipeline failure the draft and step are kept so the applicant can retry. On
    /// success the wizard resets to an empty draft on the first step.
    pub async fn next(
        &mut self,
        pipeline: &SubmissionPipeline,
        session: &SessionContext,
    ) -> AdmissionResult<WizardOutcome> {
        match self.navigator.advance(&self.draft) {
            Advance::Moved { from, to } => {
                tracing::debug!(from = from.title(), to = to.title(), "form step advanced");
                self.errors = ValidationErrors::new();
                Ok(WizardOutcome::Moved(to))
            }
            Advance::Blocked(errors) => {
                tracing::debug!(
                    step = self.navigator.current().title(),
                    invalid = errors.len(),
                    "form step blocked"
                );
                self.errors = errors;
                Ok(WizardOutcome::Blocked)
            }
            Advance::Submit(form) => {
                self.errors = ValidationErrors::new();
                let receipt = pipeline.submit(session, form).await?;
                self.draft = FormDraft::default();
                self.navigator = StepNavigator::new();
                Ok(WizardOutcome::Submitted(receipt))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::admission_rules;
    use crate::schema::DocumentSlot;
    use crate::validation::tests::complete_draft;

    #[test]
    fn every_field_belongs_to_exactly_one_step() {
        for field in FieldPath::all() {
            let owners = Step::ALL.iter().filter(|step| step.owns(field)).count();
            assert_eq!(owners, 1, "{field}");
        }
        for rule in admission_rules() {
            assert!(Step::ALL.iter().any(|step| step.owns(rule.field())));
        }
    }

    #[test]
    fn steps_have_ids_and_titles() {
        let titles: Vec<_> = Step::ALL.iter().map(|s| s.title()).collect();
        assert_eq!(
            titles,
            ["Profile", "Education", "References", "Upload Documents"]
        );
        assert_eq!(Step::Education.id(), "Step 2");
        assert!(Step::UploadDocuments.is_last());
        assert_eq!(Step::Profile.previous(), None);
        assert_eq!(Step::from_index(4), None);
    }

    #[test]
    fn advance_is_blocked_by_current_step_errors() {
        let mut navigator = StepNavigator::new();
        let draft = FormDraft::new();

        match navigator.advance(&draft) {
            Advance::Blocked(errors) => {
                assert!(errors.fields().all(|field| Step::Profile.owns(field)));
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert_eq!(navigator.current(), Step::Profile);
    }

    #[test]
    fn advance_ignores_errors_in_later_steps() {
        let mut draft = complete_draft();
        draft.attach(DocumentSlot::Tor, None);
        let mut navigator = StepNavigator::new();

        assert!(matches!(
            navigator.advance(&draft),
            Advance::Moved {
                from: Step::Profile,
                to: Step::Education
            }
        ));
        assert!(matches!(navigator.advance(&draft), Advance::Moved { .. }));
        assert!(matches!(navigator.advance(&draft), Advance::Moved { .. }));
        assert_eq!(navigator.current(), Step::UploadDocuments);
        assert!(matches!(navigator.advance(&draft), Advance::Blocked(_)));
    }

    #[test]
    fn last_step_yields_validated_form() {
        let draft = complete_draft();
        let mut navigator = StepNavigator::new();
        for _ in 0..3 {
            navigator.advance(&draft);
        }
        assert!(matches!(navigator.advance(&draft), Advance::Submit(_)));
        assert_eq!(navigator.current(), Step::UploadDocuments);
    }

    #[test]
    fn back_is_unconditional_and_stops_at_first_step() {
        let draft = complete_draft();
        let mut navigator = StepNavigator::new();
        navigator.advance(&draft);
        assert_eq!(navigator.back(), Step::Profile);
        assert_eq!(navigator.back(), Step::Profile);
    }
}
