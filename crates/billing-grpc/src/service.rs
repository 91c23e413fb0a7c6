// Use the shared api-shared crate for generated protobuf types.
use api_shared::auth::{self, API_KEY_HEADER};
use api_shared::billing::{
    billing_service_server::BillingService, BillingRequest, BillingResponse,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tonic::service::Interceptor;
use tonic::{Request, Response, Status};

/// Status reported for every account this service creates.
pub const ACCOUNT_STATUS_ACTIVE: &str = "ACTIVE";

/// Optional API-key check for incoming billing calls.
///
/// With no expected key configured every request passes; otherwise `x-api-key` must match.
#[derive(Clone, Debug, Default)]
pub struct ApiKeyInterceptor {
    expected: Option<String>,
}

impl ApiKeyInterceptor {
    pub fn new(expected: Option<String>) -> Self {
        Self { expected }
    }
}

impl Interceptor for ApiKeyInterceptor {
    fn call(&mut self, req: Request<()>) -> Result<Request<()>, Status> {
        let Some(expected) = &self.expected else {
            return Ok(req);
        };

        let api_key = req
            .metadata()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Status::unauthenticated("Missing x-api-key header"))?;

        auth::validate_api_key(api_key, expected)?;
        Ok(req)
    }
}

/// In-process billing ledger.
///
/// Account creation is idempotent per patient id: asking again for a known patient returns the
/// account created the first time.
#[derive(Default, Clone, Debug)]
pub struct BillingAccounts {
    accounts: Arc<Mutex<HashMap<String, BillingResponse>>>,
}

impl BillingAccounts {
    /// Number of accounts created so far.
    pub fn len(&self) -> usize {
        self.accounts.lock().map(|a| a.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[tonic::async_trait]
impl BillingService for BillingAccounts {
    async fn create_billing_account(
        &self,
        req: Request<BillingRequest>,
    ) -> Result<Response<BillingResponse>, Status> {
        let req = req.into_inner();
        let patient_id = req.patient_id.trim();
        if patient_id.is_empty() {
            return Err(Status::invalid_argument("patient_id is required"));
        }

        tracing::info!(
            patient_id = %patient_id,
            name = %req.name,
            email = %req.email,
            "Create billing account request received"
        );

        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| Status::internal("billing ledger is unavailable"))?;
        let account = accounts
            .entry(patient_id.to_string())
            .or_insert_with(|| BillingResponse {
                account_id: uuid::Uuid::new_v4().simple().to_string(),
                status: ACCOUNT_STATUS_ACTIVE.into(),
            })
            .clone();

        Ok(Response::new(account))
    }
}
