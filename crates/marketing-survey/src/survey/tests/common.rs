use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::survey::domain::{SurveyRecord, SurveyResult};
use crate::survey::mail::{MailError, MailMessage, MailTransport};
use crate::survey::service::{IntakeSettings, SurveyIntakeService};
use crate::survey::storage::{StoreError, SurveyId, SurveyStore};
use crate::survey::survey_router;

pub(super) fn submitted_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53)
        .single()
        .expect("valid timestamp")
}

/// A record answered entirely from the option catalog.
pub(super) fn complete_record() -> SurveyRecord {
    let payload = serde_json::json!({
        "storeName": "맛있는 분식",
        "storeType": "분식점",
        "businessArea": "대학가",
        "storeSize": "10-20평",
        "ownerName": "김사장",
        "phoneNumber": "010-1234-5678",
        "email": "owner@example.com",
        "naverPlace": {
            "attractivePhotos": "매우 잘 되어있음",
            "reservationFeature": "가끔 사용",
            "regularNews": "주 1-2회",
            "detailedDirections": "보통",
            "freeMarketingMessage": "사용 안함",
            "seoOptimization": "잘 하고 있음",
            "clipVideo": "1-2개 있음",
            "statisticsAnalysis": "정기적으로 확인"
        },
        "instagram": {
            "searchableContent": "많이 있음",
            "videoCount": "5-9개",
            "reviews": "조금 있음"
        },
        "blogMarketing": {
            "latestContent": "최근 3개월 내",
            "detailedInfo": "보통"
        },
        "google": { "accurateInfo": "대부분 정확함" },
        "paidAds": {
            "naverPlaceAds": "현재 진행중",
            "naverPlaceAdsBudget": "30-50만원",
            "naverPowerlink": "해본 적 없음",
            "naverPowerlinkBudget": "",
            "instagramReels": "모르겠음",
            "instagramReelsBudget": ""
        }
    });
    serde_json::from_value(payload).expect("fixture parses")
}

pub(super) fn mailing_settings(persist: bool) -> IntakeSettings {
    IntakeSettings {
        persist,
        sender: Some("survey@example.com".to_string()),
        recipients: vec!["consult@example.com".to_string()],
    }
}

pub(super) fn build_service(
    settings: IntakeSettings,
) -> (
    SurveyIntakeService<MemoryStore, RecordingMailer>,
    Arc<MemoryStore>,
    Arc<RecordingMailer>,
) {
    let store = Arc::new(MemoryStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let service = SurveyIntakeService::new(store.clone(), mailer.clone(), settings);
    (service, store, mailer)
}

pub(super) fn router_with_service(
    service: SurveyIntakeService<MemoryStore, RecordingMailer>,
) -> axum::Router {
    survey_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) records: Arc<Mutex<BTreeMap<String, SurveyRecord>>>,
}

impl MemoryStore {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }
}

impl SurveyStore for MemoryStore {
    fn put(&self, id: &SurveyId, record: &SurveyRecord) -> Result<SurveyResult, StoreError> {
        id.validate()?;
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(id.0.clone(), record.clone());
        Ok(SurveyResult {
            id: id.0.clone(),
            submitted_at: id.submitted_at().unwrap_or_else(Utc::now),
            record: record.clone(),
        })
    }

    fn list(&self) -> Result<Vec<SurveyResult>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut results: Vec<SurveyResult> = guard
            .iter()
            .map(|(id, record)| SurveyResult {
                id: id.clone(),
                submitted_at: SurveyId(id.clone())
                    .submitted_at()
                    .unwrap_or_else(Utc::now),
                record: record.clone(),
            })
            .collect();
        results.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(results)
    }

    fn delete(&self, id: &SurveyId) -> Result<(), StoreError> {
        id.validate()?;
        self.records
            .lock()
            .expect("store mutex poisoned")
            .remove(&id.0)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.0.clone()))
    }
}

pub(super) struct UnavailableStore;

impl SurveyStore for UnavailableStore {
    fn put(&self, _id: &SurveyId, _record: &SurveyRecord) -> Result<SurveyResult, StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    fn list(&self) -> Result<Vec<SurveyResult>, StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn delete(&self, _id: &SurveyId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingMailer {
    sent: Arc<Mutex<Vec<MailMessage>>>,
}

impl RecordingMailer {
    pub(super) fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

impl MailTransport for RecordingMailer {
    fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}

pub(super) struct FailingMailer;

impl MailTransport for FailingMailer {
    fn send(&self, _message: &MailMessage) -> Result<(), MailError> {
        Err(MailError::Transport("smtp relay refused connection".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
