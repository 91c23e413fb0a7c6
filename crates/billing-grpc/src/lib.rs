//! # Billing gRPC
//!
//! gRPC stub of the billing system that the patient service provisions accounts in.
//!
//! Handles:
//! - `billing.v1.BillingService/CreateBillingAccount`, idempotent per patient id
//! - optional `x-api-key` authentication
//! - optional gRPC server reflection
//!
//! Uses `api-shared` for the generated protobuf types.

#![warn(rust_2018_idioms)]

pub mod service;

pub use service::{ApiKeyInterceptor, BillingAccounts, ACCOUNT_STATUS_ACTIVE};

use api_shared::billing::billing_service_server::BillingServiceServer;
use api_shared::FILE_DESCRIPTOR_SET;
use std::future::Future;
use std::net::SocketAddr;
use tonic::transport::Server;

/// Default gRPC bind address.
pub const DEFAULT_BILLING_GRPC_ADDR: &str = "0.0.0.0:9001";

#[derive(Debug, thiserror::Error)]
pub enum BillingServerError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to build reflection service: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Startup configuration for the billing server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BillingServerConfig {
    pub addr: SocketAddr,
    pub api_key: Option<String>,
    pub enable_reflection: bool,
}

impl BillingServerConfig {
    /// Reads `BILLING_GRPC_ADDR`, `BILLING_API_KEY` and `BILLING_ENABLE_REFLECTION`.
    ///
    /// # Errors
    ///
    /// Returns `BillingServerError::Config` if the address does not parse.
    pub fn from_env() -> Result<Self, BillingServerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] but reads values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `BillingServerError::Config` if the address does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BillingServerError> {
        let raw_addr = lookup("BILLING_GRPC_ADDR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BILLING_GRPC_ADDR.into());
        let addr = raw_addr.parse().map_err(|_| {
            BillingServerError::Config(format!("BILLING_GRPC_ADDR is not a socket address: '{raw_addr}'"))
        })?;

        let api_key = lookup("BILLING_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let enable_reflection = lookup("BILLING_ENABLE_REFLECTION")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            addr,
            api_key,
            enable_reflection,
        })
    }
}

/// Runs the billing gRPC server until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the reflection service cannot be built or the server fails to bind or
/// run.
pub async fn serve_with_shutdown(
    config: BillingServerConfig,
    accounts: BillingAccounts,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<(), BillingServerError> {
    tracing::info!("-- Starting billing gRPC on {}", config.addr);
    if config.api_key.is_none() {
        tracing::warn!("BILLING_API_KEY is not set; billing gRPC accepts unauthenticated calls");
    }

    let billing = BillingServiceServer::with_interceptor(
        accounts,
        ApiKeyInterceptor::new(config.api_key.clone()),
    );

    let mut router = Server::builder().add_service(billing);

    if config.enable_reflection {
        let reflection_service = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        router = router.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    } else {
        tracing::info!("gRPC server reflection disabled");
    }

    router.serve_with_shutdown(config.addr, shutdown).await?;
    Ok(())
}

/// Runs the billing gRPC server until the process exits.
///
/// # Errors
///
/// See [`serve_with_shutdown`].
pub async fn serve(config: BillingServerConfig) -> Result<(), BillingServerError> {
    serve_with_shutdown(config, BillingAccounts::default(), std::future::pending()).await
}
