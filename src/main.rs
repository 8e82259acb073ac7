use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use api_shared::auth::{KEYS_FILE_ENV, keys_file_from_env_value};
use api_shared::ApiKeyGateway;
use medrec_core::config::data_file_from_env_value;
use medrec_core::constants::DATA_FILE_ENV;
use medrec_core::{CoreConfig, JsonFileStore, PatientService};

/// Main entry point for the medrec server
///
/// Serves the JSON API, the browsing pages and the Swagger UI on one port.
///
/// # Environment Variables
/// - `PORT`: listening port on 0.0.0.0 (default: 5000)
/// - `MEDREC_DATA_FILE`: JSON document holding the patient collection (default: "informacion_medica.json")
/// - `API_KEYS`: comma-separated API keys, re-read on every request
/// - `MEDREC_KEYS_FILE`: side file with `{"keys": [...]}`, re-read on every request (default: "api_keys.json")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medrec_run=info".parse()?)
                .add_directive("medrec_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = match std::env::var("PORT") {
        Ok(raw) => raw.trim().parse()?,
        Err(_) => 5000,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let cfg = CoreConfig::new(data_file_from_env_value(std::env::var(DATA_FILE_ENV).ok()))?;
    let keys_file = keys_file_from_env_value(std::env::var(KEYS_FILE_ENV).ok());

    tracing::info!("++ Starting medrec on {}", addr);
    tracing::info!("++ Patient data file: {}", cfg.data_file().display());
    tracing::info!("++ API key file: {}", keys_file.display());

    let patients = PatientService::new(Arc::new(JsonFileStore::new(cfg.data_file())));
    let gateway = ApiKeyGateway::with_env_and_file(keys_file);
    if gateway.valid_keys().is_empty() {
        tracing::warn!("no API keys configured; every /api request will be rejected");
    }

    let app = api_rest::router(AppState::new(patients, gateway)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
