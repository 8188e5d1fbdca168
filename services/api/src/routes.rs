use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use marketing_survey::survey::{survey_router, MailTransport, SurveyIntakeService, SurveyStore};
use serde_json::json;
use std::sync::Arc;

/// Survey endpoints plus the operational probes.
pub(crate) fn with_survey_routes<S, M>(service: Arc<SurveyIntakeService<S, M>>) -> axum::Router
where
    S: SurveyStore + 'static,
    M: MailTransport + 'static,
{
    survey_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{ConfiguredMailer, InMemorySurveyStore};
    use axum::body::Body;
    use axum::http::Request;
    use marketing_survey::survey::{IntakeSettings, TracingMailer};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, Arc<InMemorySurveyStore>) {
        let store = Arc::new(InMemorySurveyStore::default());
        let service = Arc::new(SurveyIntakeService::new(
            store.clone(),
            Arc::new(ConfiguredMailer::Log(TracingMailer)),
            IntakeSettings {
                persist: true,
                sender: None,
                recipients: Vec::new(),
            },
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        (with_survey_routes(service).layer(Extension(state)), store)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let (router, _) = app(false);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");

        let (router, _) = app(true);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dev_mode_submission_is_accepted_and_stored() {
        let (router, store) = app(true);
        let payload = json!({
            "storeName": "Harbor Cafe",
            "phoneNumber": "010-3333-4444",
            "paidAds": { "naverPlaceAds": "해본 적 없음", "naverPlaceAdsBudget": "" }
        });

        let response = router
            .oneshot(
                Request::post("/api/survey")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["emailSent"], false);
        let stored = store.list().expect("list succeeds");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record.paid_ads.naver_place_ads_budget, None);
    }

    #[tokio::test]
    async fn metrics_render_as_prometheus_text() {
        let (router, _) = app(true);
        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
