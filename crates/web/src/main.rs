use std::sync::Arc;

use archive_export::{
    storage::{StorageConfig, SupabaseStorage},
    ArchiveExporter, ExportJob,
};
use database::{DatabaseConnectionInfo, PgDatabase};
use directions::DirectionsConfig;
use tracing_subscriber::EnvFilter;
use web::{api::analytics_proxy::ProxyConfig, start_web_server, WebConfig, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    // request tracing, kept apart from the `log` output above
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    if let Err(why) = tracing::subscriber::set_global_default(subscriber) {
        log::warn!("Could not install tracing subscriber: {why}");
    }

    // archive export
    let export_job = archive_export_job().await;

    // directions
    let directions = DirectionsConfig::from_env().map(DirectionsConfig::provider);
    match &directions {
        Some(provider) => log::info!("Using {} directions.", provider.name()),
        None => log::warn!("No directions provider configured."),
    }

    // web server
    let state = WebState::new(ProxyConfig::from_env(), export_job, directions);
    if let Err(why) = start_web_server(state, WebConfig::from_env()).await {
        log::error!("Web server stopped: {why}");
        std::process::exit(1);
    }
}

async fn archive_export_job() -> Option<Arc<dyn ArchiveExporter>> {
    let Some(database_connection_info) = DatabaseConnectionInfo::from_env() else {
        log::warn!("No database connection info in env, archive export disabled.");
        return None;
    };
    let Some(storage_config) = StorageConfig::from_env() else {
        log::warn!("No storage config in env, archive export disabled.");
        return None;
    };

    match PgDatabase::connect(database_connection_info).await {
        Ok(database) => {
            let storage = SupabaseStorage::new(storage_config);
            let export_job: Arc<dyn ArchiveExporter> = Arc::new(ExportJob::new(database, storage));
            Some(export_job)
        }
        Err(why) => {
            log::error!("Could not connect to database, archive export disabled: {why}");
            None
        }
    }
}
