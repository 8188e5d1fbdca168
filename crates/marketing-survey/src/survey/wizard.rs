use super::catalog::{self, implies_spend};
use super::domain::{SurveyField, SurveyRecord, SurveyStep};
use super::service::{SubmissionError, SubmissionReceipt, SurveySubmitter};

/// Message shown to the respondent when a submission does not go through.
pub const RETRY_PROMPT: &str = "제출 중 오류가 발생했습니다. 다시 시도해주세요.";

/// Step-by-step survey session held by a single respondent.
///
/// Transitions mirror the form controls: `next` and `prev` move one step,
/// `submit` leaves the paid-ads step for the terminal `Complete` step, and
/// `reset` starts over from there.
#[derive(Debug, Clone, Default)]
pub struct SurveyWizard {
    step: SurveyStep,
    record: SurveyRecord,
}

impl SurveyWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> SurveyStep {
        self.step
    }

    pub fn record(&self) -> &SurveyRecord {
        &self.record
    }

    /// `(current, total)` in one-based form, e.g. `(1, 7)` on the first step.
    pub fn position(&self) -> (usize, usize) {
        (self.step.index() + 1, SurveyStep::ordered().len())
    }

    /// Progress bar fill in percent.
    pub fn progress_percent(&self) -> u8 {
        let last = SurveyStep::LAST.index();
        ((self.step.index() * 100) / last) as u8
    }

    pub fn is_step_valid(&self, step: SurveyStep) -> bool {
        self.missing_fields(step).is_empty()
    }

    /// Required fields of `step` that are still empty.
    pub fn missing_fields(&self, step: SurveyStep) -> Vec<SurveyField> {
        step.required_fields()
            .into_iter()
            .filter(|field| !self.record.is_answered(*field))
            .collect()
    }

    /// Whether the forward control of the current step (next, or submit on
    /// the paid-ads step) is enabled.
    pub fn can_advance(&self) -> bool {
        self.step < SurveyStep::Complete && self.is_step_valid(self.step)
    }

    pub fn can_go_back(&self) -> bool {
        self.step > SurveyStep::FIRST
    }

    /// Fields rendered for `step`; budgets appear only while relevant.
    pub fn visible_fields(&self, step: SurveyStep) -> Vec<SurveyField> {
        SurveyField::ALL
            .iter()
            .copied()
            .filter(|field| field.step() == step)
            .filter(|field| {
                field.budget_parent().is_none() || catalog::budget_visible(&self.record, *field)
            })
            .collect()
    }

    /// Record one answer.
    ///
    /// Choice questions only accept their catalog labels (or `""` to clear).
    /// Moving a paid-ads answer away from current or past spend drops the
    /// matching budget.
    pub fn set(&mut self, field: SurveyField, value: impl Into<String>) -> Result<(), WizardError> {
        if self.step == SurveyStep::Complete {
            return Err(WizardError::AlreadySubmitted);
        }

        let value = value.into();
        let question = catalog::question(field);
        if !value.is_empty() && !question.is_free_text() && !question.offers(&value) {
            return Err(WizardError::UnknownOption { field, value });
        }
        if !value.is_empty()
            && field.budget_parent().is_some()
            && !catalog::budget_visible(&self.record, field)
        {
            return Err(WizardError::FieldHidden(field));
        }

        if let Some(budget) = field.budget_child() {
            if !implies_spend(&value) {
                self.record.set_answer(budget, "");
            }
        }
        self.record.set_answer(field, value);
        Ok(())
    }

    pub fn next(&mut self) -> Result<SurveyStep, WizardError> {
        match self.step {
            SurveyStep::Complete => return Err(WizardError::AlreadySubmitted),
            SurveyStep::PaidAds => return Err(WizardError::SubmissionRequired),
            _ => {}
        }
        self.ensure_valid(self.step)?;

        let next = self.step.next().ok_or(WizardError::AlreadySubmitted)?;
        self.step = next;
        Ok(next)
    }

    pub fn prev(&mut self) -> Result<SurveyStep, WizardError> {
        let previous = self.step.previous().ok_or(WizardError::AtFirstStep)?;
        self.step = previous;
        Ok(previous)
    }

    /// Send the record through `submitter` and finish the survey.
    ///
    /// On failure the wizard stays on the paid-ads step with every answer
    /// intact so the respondent can retry.
    pub fn submit<S>(&mut self, submitter: &S) -> Result<SubmissionReceipt, WizardError>
    where
        S: SurveySubmitter + ?Sized,
    {
        if self.step != SurveyStep::PaidAds {
            return Err(WizardError::NotAtSubmitStep(self.step));
        }
        self.ensure_valid(SurveyStep::PaidAds)?;

        let receipt = submitter.submit(&self.record)?;
        if !receipt.success {
            return Err(WizardError::Submission(SubmissionError::Rejected(
                receipt.message,
            )));
        }

        self.step = SurveyStep::Complete;
        Ok(receipt)
    }

    /// Clear every answer and return to the first step.
    pub fn reset(&mut self) -> Result<(), WizardError> {
        if self.step != SurveyStep::Complete {
            return Err(WizardError::NotComplete(self.step));
        }
        *self = Self::default();
        Ok(())
    }

    fn ensure_valid(&self, step: SurveyStep) -> Result<(), WizardError> {
        let missing = self.missing_fields(step);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WizardError::StepIncomplete { step, missing })
        }
    }
}

/// Refused wizard transitions and edits.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("step '{}' is missing {} required answer(s)", .step.label(), .missing.len())]
    StepIncomplete {
        step: SurveyStep,
        missing: Vec<SurveyField>,
    },
    #[error("already on the first step")]
    AtFirstStep,
    #[error("the paid-ads step is left by submitting the survey")]
    SubmissionRequired,
    #[error("surveys can only be submitted from the paid-ads step (current: {})", .0.label())]
    NotAtSubmitStep(SurveyStep),
    #[error("the survey can only be reset once it is complete (current: {})", .0.label())]
    NotComplete(SurveyStep),
    #[error("the survey has already been submitted")]
    AlreadySubmitted,
    #[error("'{value}' is not an offered answer for {}", .field.key())]
    UnknownOption { field: SurveyField, value: String },
    #[error("{} is not shown for the current paid-ads answer", .0.key())]
    FieldHidden(SurveyField),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl WizardError {
    /// Validation refusals only disable controls; they are not shown as errors.
    pub fn is_validation(&self) -> bool {
        matches!(self, WizardError::StepIncomplete { .. })
    }

    /// Text for the respondent, for refusals the form surfaces at all.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            WizardError::Submission(_) => Some(RETRY_PROMPT),
            _ => None,
        }
    }
}
