//! # API REST
//!
//! REST API implementation for the patient service.
//!
//! Handles:
//! - HTTP endpoints with axum under `/api/v1/patients`
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! All patient behaviour lives in [`patient_core::PatientService`]; this crate only translates
//! between HTTP and the service.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::collections::BTreeMap;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{pb, HealthService};
use patient_core::{PatientError, PatientId, PatientService};

/// Name reported by the health endpoint.
pub const SERVICE_NAME: &str = "Patient REST API";

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers.
#[derive(Clone)]
pub struct AppState {
    patients: PatientService,
}

impl AppState {
    pub fn new(patients: PatientService) -> Self {
        Self { patients }
    }
}

/// Error body returned for rejected or failed requests.
///
/// `patientId` is only present when a patient was stored but billing provisioning failed.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRes {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

/// HTTP rendering of a [`PatientError`].
#[derive(Debug)]
pub struct ApiError(PatientError);

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        Self(err)
    }
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorRes {
            message: message.into(),
            patient_id: None,
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            PatientError::Validation(errors) => {
                let body: BTreeMap<String, String> = errors.as_map().clone();
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            PatientError::DuplicateEmail(_) => {
                message(StatusCode::BAD_REQUEST, "Email address already exists")
            }
            PatientError::NotFound(_) => message(StatusCode::BAD_REQUEST, "Patient not found"),
            err @ (PatientError::InvalidInput(_) | PatientError::InvalidDate { .. }) => {
                message(StatusCode::BAD_REQUEST, err.to_string())
            }
            err @ PatientError::AlreadyProvisioned(_) => {
                message(StatusCode::CONFLICT, err.to_string())
            }
            PatientError::Provisioning { patient_id, source } => {
                tracing::error!(patient_id = %patient_id, error = %source, "Billing provisioning failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorRes {
                        message: "Patient was saved but billing provisioning failed".into(),
                        patient_id: Some(patient_id.to_string()),
                    }),
                )
                    .into_response()
            }
            err @ (PatientError::Persistence(_) | PatientError::Setup { .. }) => {
                tracing::error!("Patient request error: {:?}", err);
                message(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

/// Unreadable request bodies are a bad request, whatever axum's reason for rejecting them.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PatientError::InvalidInput(rejection.body_text()))
    }
}

/// JSON body extractor that reports rejections as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct AppJson<T>(T);

type ApiResult<T> = Result<T, ApiError>;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        get_patient,
        create_patient,
        update_patient,
        delete_patient,
        retry_billing,
    ),
    components(schemas(
        pb::HealthRes,
        pb::PatientReq,
        pb::PatientRes,
        pb::BillingAccountRes,
        ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router over `state`, including Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/patients",
            get(list_patients).post(create_patient),
        )
        .route(
            "/api/v1/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/api/v1/patients/:id/billing", post(retry_billing))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = pb::HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<pb::HealthRes> {
    Json(HealthService::check_health(SERVICE_NAME))
}

#[utoipa::path(
    get,
    path = "/api/v1/patients",
    responses(
        (status = 200, description = "List of patients", body = [pb::PatientRes]),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List all patients in the system
///
/// # Errors
/// Returns `500 Internal Server Error` if the store cannot be read.
#[axum::debug_handler]
async fn list_patients(State(state): State<AppState>) -> ApiResult<Json<Vec<pb::PatientRes>>> {
    Ok(Json(state.patients.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Patient", body = pb::PatientRes),
        (status = 400, description = "Unknown or malformed identifier", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<pb::PatientRes>> {
    let id = PatientId::parse(&id)?;
    Ok(Json(state.patients.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/patients",
    request_body = pb::PatientReq,
    responses(
        (status = 200, description = "Patient created", body = pb::PatientRes),
        (status = 400, description = "Invalid request or email already in use"),
        (status = 500, description = "Internal server error", body = ErrorRes),
        (status = 502, description = "Patient saved but billing provisioning failed", body = ErrorRes)
    )
)]
/// Register a new patient
///
/// Stores the patient, provisions a billing account and publishes a patient-created event.
///
/// # Arguments
/// * `req` - Patient details; all fields including `registeredDate` are required
///
/// # Returns
/// * `Ok(Json<pb::PatientRes>)` - The stored patient with its assigned identifier
///
/// # Errors
/// Returns `400 Bad Request` for invalid fields or an email already in use, `500` if the
/// store fails, and `502 Bad Gateway` (with `patientId`) if billing provisioning fails after
/// the patient was stored.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    AppJson(req): AppJson<pb::PatientReq>,
) -> ApiResult<Json<pb::PatientRes>> {
    Ok(Json(state.patients.create(&req).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    request_body = pb::PatientReq,
    responses(
        (status = 200, description = "Patient updated", body = pb::PatientRes),
        (status = 400, description = "Invalid request, unknown patient or email already in use"),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Update an existing patient
///
/// `registeredDate` is ignored; it is fixed when the patient is registered.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    AppJson(req): AppJson<pb::PatientReq>,
) -> ApiResult<Json<pb::PatientRes>> {
    let id = PatientId::parse(&id)?;
    Ok(Json(state.patients.update(id, &req).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/patients/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 204, description = "Patient deleted (or did not exist)"),
        (status = 400, description = "Malformed identifier", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn delete_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<StatusCode> {
    let id = PatientId::parse(&id)?;
    state.patients.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/patients/{id}/billing",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Billing account provisioned", body = pb::BillingAccountRes),
        (status = 400, description = "Unknown or malformed identifier", body = ErrorRes),
        (status = 409, description = "Billing account is already active", body = ErrorRes),
        (status = 502, description = "Billing provisioning failed", body = ErrorRes)
    )
)]
/// Retry billing provisioning for a stored patient
///
/// Used to reconcile a patient whose creation returned `502`. On success the patient-created
/// event is published as well. A patient whose account is already active gets `409 Conflict`.
#[axum::debug_handler]
async fn retry_billing(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<pb::BillingAccountRes>> {
    let id = PatientId::parse(&id)?;
    let account = state.patients.retry_provisioning(id).await?;
    Ok(Json(pb::BillingAccountRes {
        patient_id: id.to_string(),
        account_id: account.account_id,
        status: account.status,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use http_body_util::BodyExt;
    use patient_core::mocks::{BillingMode, MockBillingProvisioner, MockEventPublisher};
    use patient_core::InMemoryPatientStore;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with(billing: Arc<MockBillingProvisioner>) -> Router {
        let service = PatientService::new(
            Arc::new(InMemoryPatientStore::new()),
            billing,
            Arc::new(MockEventPublisher::new()),
            "patient",
            Duration::from_millis(200),
        );
        router(AppState::new(service))
    }

    fn app() -> Router {
        app_with(Arc::new(MockBillingProvisioner::succeeding()))
    }

    fn ada() -> Value {
        json!({
            "name": "Ada",
            "email": "ada@example.com",
            "address": "1 Infinite Loop",
            "dateOfBirth": "1990-01-01",
            "registeredDate": "2024-01-01"
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        match body {
            Some(body) => {
                send_raw(app, method, uri, Some("application/json"), body.to_string()).await
            }
            None => send_raw(app, method, uri, None, String::new()).await,
        }
    }

    async fn send_raw(
        app: &Router,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder
            .body(Body::from(body))
            .expect("request should build");

        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_create_then_list_and_get() {
        let app = app();

        let (status, created) = send(&app, Method::POST, "/api/v1/patients", Some(ada())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["name"], "Ada");
        assert_eq!(created["dateOfBirth"], "1990-01-01");
        assert!(created.get("registeredDate").is_none());
        let id = created["id"].as_str().expect("id is a string").to_string();
        assert!(!id.is_empty());

        let (status, list) = send(&app, Method::GET, "/api/v1/patients", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().expect("list is an array").len(), 1);

        let (status, fetched) =
            send(&app, Method::GET, &format!("/api/v1/patients/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_bad_request() {
        let app = app();
        send(&app, Method::POST, "/api/v1/patients", Some(ada())).await;

        let (status, body) = send(&app, Method::POST, "/api/v1/patients", Some(ada())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Email address already exists" }));
    }

    #[tokio::test]
    async fn test_unreadable_bodies_are_bad_request() {
        let app = app();

        let (status, body) = send_raw(
            &app,
            Method::POST,
            "/api/v1/patients",
            None,
            ada().to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/patients",
            Some(json!({ "name": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_raw(
            &app,
            Method::POST,
            "/api/v1/patients",
            Some("application/json"),
            "{not json".into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/v1/patients/{}", PatientId::generate());
        let (status, _) =
            send_raw(&app, Method::PUT, &uri, Some("text/plain"), ada().to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, list) = send(&app, Method::GET, "/api/v1/patients", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_validation_errors_are_a_field_map() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/patients",
            Some(json!({ "name": "", "email": "not-an-email" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["name"], "Name is mandatory");
        assert_eq!(body["email"], "Email should be valid");
        assert_eq!(body["address"], "Address is mandatory");
        assert_eq!(body["registeredDate"], "Registered date is mandatory");
    }

    #[tokio::test]
    async fn test_billing_failure_is_bad_gateway_with_patient_id() {
        let billing = Arc::new(MockBillingProvisioner::new(BillingMode::Unavailable));
        let app = app_with(billing.clone());

        let (status, body) = send(&app, Method::POST, "/api/v1/patients", Some(ada())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let id = body["patientId"]
            .as_str()
            .expect("patientId is present")
            .to_string();

        billing.set_mode(BillingMode::Succeed);
        let (status, account) = send(
            &app,
            Method::POST,
            &format!("/api/v1/patients/{id}/billing"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(account["patientId"], id.as_str());
        assert_eq!(account["status"], "ACTIVE");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/patients/{id}/billing"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].is_string());
        assert_eq!(billing.calls(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = app();
        let (_, created) = send(&app, Method::POST, "/api/v1/patients", Some(ada())).await;
        let uri = format!(
            "/api/v1/patients/{}",
            created["id"].as_str().expect("id is a string")
        );

        let mut changes = ada();
        changes["address"] = json!("2 Infinite Loop");
        changes["registeredDate"] = json!("");
        let (status, updated) = send(&app, Method::PUT, &uri, Some(changes)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["address"], "2 Infinite Loop");

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_unknown_patient_is_bad_request() {
        let uri = format!("/api/v1/patients/{}", PatientId::generate());
        let (status, body) = send(&app(), Method::PUT, &uri, Some(ada())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Patient not found" }));
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let (status, _) = send(&app(), Method::GET, "/api/v1/patients/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
