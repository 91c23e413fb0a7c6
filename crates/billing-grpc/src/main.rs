//! Standalone billing gRPC server binary.
//!
//! ## Purpose
//! Runs the billing service stub on its own, for setups where the patient REST API runs in a
//! separate process.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use billing_grpc::{serve, BillingServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("billing_grpc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BillingServerConfig::from_env()?;
    serve(config).await?;

    Ok(())
}
