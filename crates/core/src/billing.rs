//! Billing provisioning.
//!
//! [`BillingProvisioner`] is the contract the orchestrator depends on: given a patient identity,
//! ask the billing system for an account. [`GrpcBillingClient`] implements it over the
//! `billing.v1.BillingService` RPC using a plaintext tonic channel.
//!
//! Failures are split into [`BillingError::RemoteUnavailable`] (transport trouble, timeouts,
//! overload) and [`BillingError::RemoteRejected`] (the billing service answered and said no).
//! The orchestrator treats both as a provisioning failure but keeps the distinction for logs.

use crate::model::PatientId;
use crate::{PatientError, PatientResult};
use api_shared::auth::API_KEY_HEADER;
use api_shared::billing::billing_service_client::BillingServiceClient;
use api_shared::billing::BillingRequest;
use async_trait::async_trait;
use std::time::Duration;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};
use tonic::Code;

/// Upper bound on establishing the underlying HTTP/2 connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// An account created in the billing system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BillingAccount {
    pub account_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BillingError {
    #[error("billing service unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("billing service rejected the request ({code}): {message}")]
    RemoteRejected { code: String, message: String },
}

impl BillingError {
    /// Classifies a gRPC status returned by the billing service.
    pub fn from_status(status: &tonic::Status) -> Self {
        match status.code() {
            // tonic reports some connection failures as Unknown.
            Code::Unknown
            | Code::Unavailable
            | Code::DeadlineExceeded
            | Code::Cancelled
            | Code::ResourceExhausted
            | Code::Aborted => BillingError::RemoteUnavailable(status.message().to_string()),
            code => BillingError::RemoteRejected {
                code: format!("{code:?}"),
                message: status.message().to_string(),
            },
        }
    }
}

pub type BillingResult<T> = std::result::Result<T, BillingError>;

/// Creates billing accounts for patients.
#[async_trait]
pub trait BillingProvisioner: Send + Sync {
    async fn provision(
        &self,
        patient_id: PatientId,
        name: &str,
        email: &str,
    ) -> BillingResult<BillingAccount>;
}

/// gRPC client for the billing service.
///
/// The channel connects lazily, so constructing the client never blocks on the network and a
/// billing outage only affects the requests that need it.
#[derive(Clone, Debug)]
pub struct GrpcBillingClient {
    client: BillingServiceClient<Channel>,
    api_key: Option<MetadataValue<Ascii>>,
}

impl GrpcBillingClient {
    /// Builds a client for `endpoint` (e.g. `http://localhost:9001`).
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if the endpoint URI or API key is malformed.
    pub fn connect_lazy(endpoint: &str, api_key: Option<&str>) -> PatientResult<Self> {
        tracing::info!("Connecting to billing service gRPC at {}", endpoint);

        let channel = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| PatientError::InvalidInput(format!("invalid billing endpoint: {e}")))?
            .connect_timeout(CONNECT_TIMEOUT)
            .connect_lazy();

        let api_key = api_key
            .map(MetadataValue::try_from)
            .transpose()
            .map_err(|_| PatientError::InvalidInput("billing API key is not valid ASCII".into()))?;

        Ok(Self {
            client: BillingServiceClient::new(channel),
            api_key,
        })
    }
}

#[async_trait]
impl BillingProvisioner for GrpcBillingClient {
    async fn provision(
        &self,
        patient_id: PatientId,
        name: &str,
        email: &str,
    ) -> BillingResult<BillingAccount> {
        let mut request = tonic::Request::new(BillingRequest {
            patient_id: patient_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        });
        if let Some(key) = &self.api_key {
            request.metadata_mut().insert(API_KEY_HEADER, key.clone());
        }

        let response = self
            .client
            .clone()
            .create_billing_account(request)
            .await
            .map_err(|status| BillingError::from_status(&status))?
            .into_inner();

        tracing::info!(
            patient_id = %patient_id,
            account_id = %response.account_id,
            status = %response.status,
            "Received response from billing service via gRPC"
        );

        Ok(BillingAccount {
            account_id: response.account_id,
            status: response.status,
        })
    }
}
