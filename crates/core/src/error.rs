use crate::billing::BillingError;
use crate::model::PatientId;
use crate::repositories::StoreError;
use crate::validation::FieldErrors;

/// Errors returned by the patient lifecycle operations.
///
/// Variants map one-to-one onto the outcomes a caller must distinguish. Collaborator errors
/// are kept as the `source` so the original cause survives into logs.
#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("request validation failed: {0}")]
    Validation(FieldErrors),
    #[error("invalid date for {field}: '{value}'")]
    InvalidDate {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("a patient with this email address already exists: {0}")]
    DuplicateEmail(String),
    #[error("patient not found with id: {0}")]
    NotFound(PatientId),
    #[error("failed to persist patient: {0}")]
    Persistence(#[source] StoreError),
    #[error("patient {patient_id} was saved but billing provisioning failed: {source}")]
    Provisioning {
        patient_id: PatientId,
        #[source]
        source: BillingError,
    },
    #[error("patient {0} already has an active billing account")]
    AlreadyProvisioned(PatientId),
    #[error("failed to set up {component}: {reason}")]
    Setup {
        component: &'static str,
        reason: String,
    },
}

impl From<StoreError> for PatientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(email) => PatientError::DuplicateEmail(email),
            StoreError::NotFound(id) => PatientError::NotFound(id),
            other => PatientError::Persistence(other),
        }
    }
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
