use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use billing_grpc::{serve as serve_billing, BillingServerConfig};
use patient_core::{CoreConfig, PatientService};

/// Default REST bind address.
const DEFAULT_REST_ADDR: &str = "0.0.0.0:4000";

/// Main entry point for the patient service
///
/// Starts both servers concurrently:
/// - the billing gRPC stub on port 9001 (configurable via BILLING_GRPC_ADDR)
/// - the patient REST API on port 4000 (configurable via PATIENT_REST_ADDR)
///
/// The REST API provisions billing accounts by calling the billing service over gRPC, at
/// `BILLING_SERVICE_ADDRESS:BILLING_SERVICE_GRPC_PORT`. With the defaults that is the stub
/// started here.
///
/// # Environment Variables
/// - `PATIENT_REST_ADDR`: REST server address (default: "0.0.0.0:4000")
/// - `BILLING_GRPC_ADDR`: billing gRPC server address (default: "0.0.0.0:9001")
/// - `BILLING_API_KEY`: API key required by, and sent to, the billing service
/// - `DATABASE_URL`: PostgreSQL URL (default: in-memory store)
/// - `KAFKA_BOOTSTRAP_SERVERS`: Kafka brokers for patient events
///
/// # Returns
/// * `Ok(())` - If servers start and run successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("patient_run=info".parse()?)
                .add_directive("patient_core=info".parse()?)
                .add_directive("billing_grpc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("PATIENT_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let billing_cfg = BillingServerConfig::from_env()?;
    let cfg = Arc::new(CoreConfig::from_env()?);

    tracing::info!("++ Starting patient REST on {}", rest_addr);

    let patient_service = PatientService::from_config(cfg).await?;
    let rest_app = router(AppState::new(patient_service));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;

    // Run both; stop when either fails
    tokio::try_join!(
        async {
            axum::serve(listener, rest_app)
                .await
                .map_err(anyhow::Error::from)
        },
        async { serve_billing(billing_cfg).await.map_err(anyhow::Error::from) },
    )?;

    Ok(())
}
