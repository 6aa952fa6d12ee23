use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_operational_routes;
use axum::extract::DefaultBodyLimit;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use job_intake::applications::{
    application_router, GoogleDriveMediaStore, InMemoryApplicationRepository,
    JobApplicationService, LocalMediaStore, MediaStore,
};
use job_intake::config::{AppConfig, ConfigError, MediaBackend};
use job_intake::error::AppError;
use job_intake::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    if let Some(root) = args.media_root.take() {
        config.media.local_root = root;
    }

    telemetry::init(&config.telemetry)?;

    match config.media.backend {
        MediaBackend::Local => {
            let store = LocalMediaStore::new(
                config.media.local_root.clone(),
                config.media.public_base_url.clone(),
            );
            info!(root = %store.root().display(), "storing documents on local disk");
            serve(config, store).await
        }
        MediaBackend::GoogleDrive => {
            let key_path = config
                .media
                .drive_service_account
                .clone()
                .ok_or(ConfigError::MissingDriveCredentials)?;
            let store = GoogleDriveMediaStore::from_service_account(
                key_path,
                config.media.drive_parent_id.clone(),
            )
            .await?;
            info!(parent = ?config.media.drive_parent_id, "storing documents on google drive");
            serve(config, store).await
        }
    }
}

async fn serve<M>(config: AppConfig, media: M) -> Result<(), AppError>
where
    M: MediaStore + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let application_service = Arc::new(JobApplicationService::new(
        repository,
        Arc::new(media),
        config.media.folder.clone(),
    ));

    let app = with_operational_routes(application_router(application_service))
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job application intake ready");

    axum::serve(listener, app).await?;
    Ok(())
}
