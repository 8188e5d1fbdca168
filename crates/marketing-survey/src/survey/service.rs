use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::catalog::off_catalog_answers;
use super::domain::{SurveyRecord, SurveyResult};
use super::mail::{MailMessage, MailTransport};
use super::report;
use super::storage::{StoreError, SurveyId, SurveyStore};

pub const SUBMITTED_MESSAGE: &str = "설문조사가 성공적으로 제출되었습니다.";
pub const DEV_MODE_MESSAGE: &str = "설문조사가 접수되었습니다. (개발 모드: 콘솔 로그 확인)";

/// Delivery settings for accepted surveys.
#[derive(Debug, Clone, Default)]
pub struct IntakeSettings {
    /// Write every accepted record to the survey store.
    pub persist: bool,
    /// Sender mailbox; `None` switches to development mode where records are
    /// only logged.
    pub sender: Option<String>,
    pub recipients: Vec<String>,
}

/// Outcome reported to the respondent after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub success: bool,
    pub email_sent: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Anything the wizard can hand a finished record to.
pub trait SurveySubmitter {
    fn submit(&self, record: &SurveyRecord) -> Result<SubmissionReceipt, SubmissionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("submission transport failed: {0}")]
    Transport(String),
}

/// Accepts survey records, mails the report, and optionally persists them.
///
/// Acceptance never depends on delivery: mail and storage failures are
/// logged and reflected in the receipt, not returned as errors.
pub struct SurveyIntakeService<S, M> {
    store: Arc<S>,
    mailer: Arc<M>,
    settings: IntakeSettings,
}

impl<S, M> SurveyIntakeService<S, M>
where
    S: SurveyStore + 'static,
    M: MailTransport + 'static,
{
    pub fn new(store: Arc<S>, mailer: Arc<M>, settings: IntakeSettings) -> Self {
        Self {
            store,
            mailer,
            settings,
        }
    }

    pub fn store(&self) -> Arc<S> {
        self.store.clone()
    }

    pub fn submit(&self, record: SurveyRecord) -> SubmissionReceipt {
        self.submit_at(record, Utc::now())
    }

    /// Accept `record` as submitted at `submitted_at`.
    pub fn submit_at(&self, record: SurveyRecord, submitted_at: DateTime<Utc>) -> SubmissionReceipt {
        let off_catalog = off_catalog_answers(&record);
        if !off_catalog.is_empty() {
            let fields: Vec<&str> = off_catalog.iter().map(|field| field.key()).collect();
            warn!(
                store = %record.store_name,
                fields = ?fields,
                "survey contains answers outside the option catalog"
            );
        }

        let (email_sent, message) = match self.settings.sender.as_deref() {
            Some(sender) => (self.send_report(sender, &record, submitted_at), SUBMITTED_MESSAGE),
            None => {
                let payload = serde_json::to_string_pretty(&record).unwrap_or_default();
                info!(
                    store = %record.store_name,
                    survey = %payload,
                    "EMAIL_USER not configured; survey logged instead of mailed"
                );
                (false, DEV_MODE_MESSAGE)
            }
        };

        let id = if self.settings.persist {
            self.persist(&record, submitted_at)
        } else {
            None
        };

        SubmissionReceipt {
            success: true,
            email_sent,
            message: message.to_string(),
            id,
        }
    }

    fn send_report(&self, sender: &str, record: &SurveyRecord, submitted_at: DateTime<Utc>) -> bool {
        let message = MailMessage {
            from: sender.to_string(),
            to: self.settings.recipients.clone(),
            subject: report::subject(record),
            html_body: report::render_html(record, submitted_at),
        };

        match self.mailer.send(&message) {
            Ok(()) => {
                info!(store = %record.store_name, recipients = message.to.len(), "survey report mailed");
                true
            }
            Err(err) => {
                warn!(store = %record.store_name, error = %err, "survey report mail failed");
                false
            }
        }
    }

    fn persist(&self, record: &SurveyRecord, submitted_at: DateTime<Utc>) -> Option<String> {
        let id = SurveyId::new(&record.store_name, submitted_at);
        match self.store.put(&id, record) {
            Ok(stored) => Some(stored.id),
            Err(err) => {
                error!(store = %record.store_name, id = %id, error = %err, "survey file save failed");
                None
            }
        }
    }

    /// Every persisted survey, newest first.
    pub fn list(&self) -> Result<Vec<SurveyResult>, StoreError> {
        self.store.list()
    }

    pub fn delete(&self, id: &SurveyId) -> Result<(), StoreError> {
        self.store.delete(id)?;
        info!(id = %id, "survey deleted");
        Ok(())
    }
}

impl<S, M> SurveySubmitter for SurveyIntakeService<S, M>
where
    S: SurveyStore + 'static,
    M: MailTransport + 'static,
{
    fn submit(&self, record: &SurveyRecord) -> Result<SubmissionReceipt, SubmissionError> {
        Ok(SurveyIntakeService::submit(self, record.clone()))
    }
}
