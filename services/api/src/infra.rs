use chrono::NaiveDate;
use marketing_survey::config::MailConfig;
use marketing_survey::survey::{
    MailError, MailMessage, MailTransport, OutboxMailer, SmtpMailer, StoreError, SurveyId,
    SurveyRecord, SurveyResult, SurveyStore, TracingMailer,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mail transport picked from configuration: an outbox directory when one is
/// set, the SMTP relay when a sender is configured, otherwise the log.
#[derive(Debug)]
pub(crate) enum ConfiguredMailer {
    Outbox(OutboxMailer),
    Smtp(SmtpMailer),
    Log(TracingMailer),
}

impl ConfiguredMailer {
    pub(crate) fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        if let Some(dir) = &config.outbox_dir {
            return Ok(ConfiguredMailer::Outbox(OutboxMailer::new(dir.clone())));
        }
        if config.sender.is_some() {
            return Ok(ConfiguredMailer::Smtp(SmtpMailer::new(&config.smtp)?));
        }
        Ok(ConfiguredMailer::Log(TracingMailer))
    }
}

impl MailTransport for ConfiguredMailer {
    fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        match self {
            ConfiguredMailer::Outbox(mailer) => mailer.send(message),
            ConfiguredMailer::Smtp(mailer) => mailer.send(message),
            ConfiguredMailer::Log(mailer) => mailer.send(message),
        }
    }
}

/// Newest-first in-memory store backing the demo.
#[derive(Default, Clone)]
pub(crate) struct InMemorySurveyStore {
    records: Arc<Mutex<Vec<SurveyResult>>>,
}

impl InMemorySurveyStore {
    fn guard(&self) -> MutexGuard<'_, Vec<SurveyResult>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SurveyStore for InMemorySurveyStore {
    fn put(&self, id: &SurveyId, record: &SurveyRecord) -> Result<SurveyResult, StoreError> {
        id.validate()?;
        let submitted_at = id
            .submitted_at()
            .ok_or_else(|| StoreError::InvalidId(id.to_string()))?;
        let result = SurveyResult {
            id: id.to_string(),
            submitted_at,
            record: record.clone(),
        };

        let mut guard = self.guard();
        guard.retain(|existing| existing.id != result.id);
        guard.push(result.clone());
        guard.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(result)
    }

    fn list(&self) -> Result<Vec<SurveyResult>, StoreError> {
        let guard = self.guard();
        Ok(guard.clone())
    }

    fn delete(&self, id: &SurveyId) -> Result<(), StoreError> {
        let mut guard = self.guard();
        let before = guard.len();
        guard.retain(|existing| existing.id != id.as_str());
        if guard.len() == before {
            Err(StoreError::NotFound(id.to_string()))
        } else {
            Ok(())
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
