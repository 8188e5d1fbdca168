use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinError;
use tracing::{error, warn};

use super::domain::SurveyRecord;
use super::mail::MailTransport;
use super::report::seoul_time;
use super::service::SurveyIntakeService;
use super::storage::{StoreError, SurveyId, SurveyStore};
use crate::admin::dashboard::filter_results;
use crate::admin::export::{export_csv, export_file_name};

const SUBMIT_FAILED_MESSAGE: &str = "설문조사 제출 중 오류가 발생했습니다.";
const LIST_FAILED_MESSAGE: &str = "설문조사 목록을 불러오는 중 오류가 발생했습니다.";
const DELETE_FAILED_MESSAGE: &str = "설문조사 삭제 중 오류가 발생했습니다.";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeleteParams {
    #[serde(default)]
    pub(crate) id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportParams {
    #[serde(default)]
    pub(crate) q: Option<String>,
}

/// Router exposing survey intake and the admin listing endpoints.
pub fn survey_router<S, M>(service: Arc<SurveyIntakeService<S, M>>) -> Router
where
    S: SurveyStore + 'static,
    M: MailTransport + 'static,
{
    Router::new()
        .route("/api/survey", post(submit_handler::<S, M>))
        .route(
            "/api/admin/surveys",
            get(list_handler::<S, M>).delete(delete_handler::<S, M>),
        )
        .route("/api/admin/surveys/export", get(export_handler::<S, M>))
        .with_state(service)
}

fn failure(status: StatusCode, message: &str, detail: Option<String>) -> Response {
    let mut payload = json!({
        "success": false,
        "message": message,
    });
    if let Some(detail) = detail {
        payload["error"] = json!(detail);
    }
    (status, axum::Json(payload)).into_response()
}

/// Run store and mail work on the blocking pool; both touch the filesystem or
/// the network synchronously.
async fn run_blocking<S, M, T, F>(
    service: &Arc<SurveyIntakeService<S, M>>,
    work: F,
) -> Result<T, JoinError>
where
    S: SurveyStore + 'static,
    M: MailTransport + 'static,
    T: Send + 'static,
    F: FnOnce(&SurveyIntakeService<S, M>) -> T + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || work(&service)).await
}

fn task_failure(message: &str, err: JoinError) -> Response {
    error!(error = %err, "survey task did not finish");
    failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        message,
        Some(err.to_string()),
    )
}

pub(crate) async fn submit_handler<S, M>(
    State(service): State<Arc<SurveyIntakeService<S, M>>>,
    payload: Result<axum::Json<SurveyRecord>, JsonRejection>,
) -> Response
where
    S: SurveyStore + 'static,
    M: MailTransport + 'static,
{
    let record = match payload {
        Ok(axum::Json(record)) => record,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "unreadable survey payload");
            return failure(
                StatusCode::BAD_REQUEST,
                SUBMIT_FAILED_MESSAGE,
                Some(rejection.body_text()),
            );
        }
    };

    match run_blocking(&service, move |service| service.submit(record)).await {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(err) => task_failure(SUBMIT_FAILED_MESSAGE, err),
    }
}

pub(crate) async fn list_handler<S, M>(
    State(service): State<Arc<SurveyIntakeService<S, M>>>,
) -> Response
where
    S: SurveyStore + 'static,
    M: MailTransport + 'static,
{
    match run_blocking(&service, |service| service.list()).await {
        Ok(Ok(surveys)) => {
            let payload = json!({
                "success": true,
                "count": surveys.len(),
                "surveys": surveys,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(Err(err)) => {
            error!(error = %err, "survey listing failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                LIST_FAILED_MESSAGE,
                Some(err.to_string()),
            )
        }
        Err(err) => task_failure(LIST_FAILED_MESSAGE, err),
    }
}

pub(crate) async fn delete_handler<S, M>(
    State(service): State<Arc<SurveyIntakeService<S, M>>>,
    Query(params): Query<DeleteParams>,
) -> Response
where
    S: SurveyStore + 'static,
    M: MailTransport + 'static,
{
    let Some(id) = params.id.filter(|id| !id.is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "설문조사 ID가 필요합니다.", None);
    };

    let id = SurveyId(id);
    match run_blocking(&service, move |service| service.delete(&id)).await {
        Ok(Ok(())) => {
            let payload = json!({
                "success": true,
                "message": "설문조사가 삭제되었습니다.",
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(Err(err @ StoreError::NotFound(_))) => {
            failure(StatusCode::NOT_FOUND, DELETE_FAILED_MESSAGE, Some(err.to_string()))
        }
        Ok(Err(err @ StoreError::InvalidId(_))) => {
            failure(StatusCode::BAD_REQUEST, DELETE_FAILED_MESSAGE, Some(err.to_string()))
        }
        Ok(Err(err)) => {
            error!(error = %err, "survey delete failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                DELETE_FAILED_MESSAGE,
                Some(err.to_string()),
            )
        }
        Err(err) => task_failure(DELETE_FAILED_MESSAGE, err),
    }
}

pub(crate) async fn export_handler<S, M>(
    State(service): State<Arc<SurveyIntakeService<S, M>>>,
    Query(params): Query<ExportParams>,
) -> Response
where
    S: SurveyStore + 'static,
    M: MailTransport + 'static,
{
    let surveys = match run_blocking(&service, |service| service.list()).await {
        Ok(Ok(surveys)) => surveys,
        Err(err) => return task_failure(LIST_FAILED_MESSAGE, err),
        Ok(Err(err)) => {
            error!(error = %err, "survey listing failed during export");
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                LIST_FAILED_MESSAGE,
                Some(err.to_string()),
            );
        }
    };

    let rows = match params.q.as_deref() {
        Some(term) => filter_results(&surveys, term),
        None => surveys.iter().collect(),
    };

    match export_csv(rows) {
        Ok(body) => {
            let file_name = export_file_name(seoul_time(Utc::now()).date());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{file_name}\""),
                    ),
                ],
                body,
            )
                .into_response()
        }
        Err(err) => {
            error!(error = %err, "csv export failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "CSV 내보내기 중 오류가 발생했습니다.",
                Some(err.to_string()),
            )
        }
    }
}
