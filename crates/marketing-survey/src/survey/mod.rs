//! Survey capture: the option catalog, the step-by-step wizard, scoring, and
//! the intake pipeline that mails and stores submitted records.

pub mod catalog;
pub mod domain;
pub mod mail;
pub mod report;
pub mod router;
pub mod scoring;
pub mod service;
pub mod storage;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use catalog::{budget_visible, implies_spend, off_catalog_answers, question, Question};
pub use domain::{
    BlogMarketingAnswers, GoogleAnswers, InstagramAnswers, NaverPlaceAnswers, PaidAdsAnswers,
    SurveyField, SurveyRecord, SurveyResult, SurveyStep,
};
pub use mail::{
    MailError, MailMessage, MailTransport, OutboxMailer, SmtpMailer, SmtpSecurity, SmtpSettings,
    TracingMailer,
};
pub use router::survey_router;
pub use scoring::{answer_points, marketing_score, ScoreBand};
pub use service::{
    IntakeSettings, SubmissionError, SubmissionReceipt, SurveyIntakeService, SurveySubmitter,
};
pub use storage::{FileSurveyStore, StoreError, SurveyId, SurveyStore};
pub use wizard::{SurveyWizard, WizardError, RETRY_PROMPT};
