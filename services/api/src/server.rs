use crate::cli::ServeArgs;
use crate::infra::{AppState, LoggingNotifier};
use crate::routes::operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use harambee::config::AppConfig;
use harambee::error::AppError;
use harambee::fund::cases::{case_router, CaseService};
use harambee::fund::contributions::{contribution_router, ContributionService};
use harambee::fund::members::{member_router, MemberService};
use harambee::fund::memory::{InMemoryDocumentStore, InMemoryFundStore};
use harambee::telemetry;
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

    let store = Arc::new(InMemoryFundStore::new());
    let documents = Arc::new(InMemoryDocumentStore::default());
    let notifier = Arc::new(LoggingNotifier);

    let member_service = Arc::new(MemberService::new(
        store.clone(),
        notifier.clone(),
        config.policy.clone(),
    ));
    let case_service = Arc::new(CaseService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        documents,
        notifier,
        config.policy.clone(),
    ));
    let contribution_service = Arc::new(ContributionService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
    ));

    let api = member_router(member_service)
        .merge(case_router(case_service))
        .merge(contribution_router(contribution_service));
    let app = operational_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "harambee fund service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
