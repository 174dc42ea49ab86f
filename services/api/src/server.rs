use crate::cli::ServeArgs;
use crate::infra::{
    seeded_discount_catalog, AppState, InMemoryCheckoutGateway, InMemoryIntake, InMemorySessions,
    InMemoryPurchases, InMemoryTickets, InMemoryTranscriber, LoggingReceipts, SessionStore,
};
use crate::routes::api_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use voice_twin::billing::checkout::CheckoutRecorder;
use voice_twin::billing::discount::DiscountService;
use voice_twin::config::{AppConfig, AppEnvironment};
use voice_twin::error::AppError;
use voice_twin::leads::LeadIntake;
use voice_twin::support::SupportService;
use voice_twin::telemetry;
use voice_twin::transcription::TranscriptionService;
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

    let discount = Arc::new(DiscountService::new(Arc::new(seeded_discount_catalog())));
    let recorder = Arc::new(CheckoutRecorder::new(
        Arc::new(InMemoryPurchases::default()),
        Arc::new(LoggingReceipts::default()),
    ));
    let transcription = Arc::new(TranscriptionService::new(
        Arc::new(InMemoryCheckoutGateway::default()),
        Arc::new(InMemoryTranscriber),
        config.transcription,
    ));
    let support = Arc::new(SupportService::new(Arc::new(InMemoryTickets::default())));
    let intake = Arc::new(LeadIntake::new(Arc::new(InMemoryIntake::default())));

    let sessions = InMemorySessions::default();
    if config.environment == AppEnvironment::Development {
        sessions.grant("dev-session", "dev-user");
        info!("development session token 'dev-session' active");
    }

    let app = api_router(
        discount,
        recorder,
        transcription,
        support,
        intake,
        Arc::new(sessions) as Arc<dyn SessionStore>,
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "voice twin api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
