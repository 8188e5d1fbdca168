use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredMailer};
use crate::routes::with_survey_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use marketing_survey::config::AppConfig;
use marketing_survey::error::AppError;
use marketing_survey::survey::{FileSurveyStore, SurveyIntakeService};
use marketing_survey::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(FileSurveyStore::new(config.survey.dir.clone()));
    let mailer = Arc::new(ConfiguredMailer::from_config(&config.mail)?);
    let intake_service = Arc::new(SurveyIntakeService::new(
        store,
        mailer,
        config.intake_settings(),
    ));

    let app = with_survey_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        survey_dir = %config.survey.dir.display(),
        save_to_file = config.survey.save_to_file,
        mail_enabled = config.mail.sender.is_some(),
        "marketing survey service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
