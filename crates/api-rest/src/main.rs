//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the patient REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development when the billing service is run separately. The
//! workspace's main `patient-run` binary runs the billing gRPC stub and the REST API together.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use patient_core::{CoreConfig, PatientService};

/// Default REST bind address.
const DEFAULT_REST_ADDR: &str = "0.0.0.0:4000";

/// Main entry point for the patient REST API server
///
/// # Environment Variables
/// - `PATIENT_REST_ADDR`: Server address (default: "0.0.0.0:4000")
/// - plus the core variables read by `CoreConfig::from_env`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the patient store cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("patient_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr =
        std::env::var("PATIENT_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    tracing::info!("-- Starting patient REST API on {}", addr);

    let cfg = Arc::new(CoreConfig::from_env()?);
    let patients = PatientService::from_config(cfg).await?;

    let app = router(AppState::new(patients));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
