use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use sga_core::{
    config::session_ttl_from_env_value,
    constants::{
        CLASSIFY_URL_ENV, DEFAULT_REST_ADDR, IMPUTE_URL_ENV, PATIENT_API_URL_ENV,
        REQUEST_TIMEOUT_ENV, REST_ADDR_ENV, SESSION_TTL_ENV,
    },
    CoreConfig, FieldSchema, HttpPredictionClient,
};

/// Main entry point for the SGA assessment service
///
/// Starts the REST server (configurable via `SGA_REST_ADDR`, default 0.0.0.0:3000) with
/// Swagger UI at `/swagger-ui`.
///
/// # Environment Variables
/// - `SGA_IMPUTE_URL`: imputation service endpoint (required)
/// - `SGA_CLASSIFY_URL`: classification service endpoint (required)
/// - `SGA_PATIENT_API_URL`: patient history service base URL (optional)
/// - `SGA_REQUEST_TIMEOUT_SECS`: remote call timeout; unset or 0 waits indefinitely
/// - `SGA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `SGA_SESSION_TTL_SECS`: idle lifetime of an assessment session (default: 1800)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is missing or invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sga_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("sga_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_env_values(
        std::env::var(IMPUTE_URL_ENV).ok(),
        std::env::var(CLASSIFY_URL_ENV).ok(),
        std::env::var(PATIENT_API_URL_ENV).ok(),
        std::env::var(REQUEST_TIMEOUT_ENV).ok(),
    )?;
    let session_ttl = session_ttl_from_env_value(std::env::var(SESSION_TTL_ENV).ok())?;
    let rest_addr = std::env::var(REST_ADDR_ENV).unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    tracing::info!("++ Imputation service at {}", cfg.impute_url());
    tracing::info!("++ Classification service at {}", cfg.classify_url());
    tracing::info!("++ Starting SGA REST on {}", rest_addr);

    let schema = Arc::new(FieldSchema::clinical()?);
    let service = Arc::new(HttpPredictionClient::new(&cfg)?);
    let app = router(AppState::new(schema, service).with_session_ttl(session_ttl));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
