//! Patient record storage.
//!
//! [`PatientStore`] is the seam between the orchestrator and durable storage. Two
//! implementations ship with the crate:
//!
//! - [`postgres::PostgresPatientStore`] - the production store, backed by a `patients` table
//!   with a `UNIQUE` email constraint.
//! - [`memory::InMemoryPatientStore`] - used for local development when no database is
//!   configured, and as the store in tests.
//!
//! Both enforce email uniqueness at write time. The orchestrator's own existence check runs
//! first, but only the store can close the race between two concurrent writers, so a store
//! must report a clash as [`StoreError::DuplicateEmail`] rather than a generic failure.

use crate::model::{NewPatient, Patient, PatientId, ProvisioningStatus};
use async_trait::async_trait;
use patient_types::EmailAddress;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryPatientStore;
pub use postgres::PostgresPatientStore;

/// Errors reported by a [`PatientStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("email address already in use: {0}")]
    DuplicateEmail(String),
    #[error("patient not found: {0}")]
    NotFound(PatientId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored row could not be read: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable keyed storage for patients.
///
/// Implementations are shared across concurrent requests and must be safe for that.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Inserts a new patient and returns it with its assigned identifier.
    ///
    /// # Errors
    ///
    /// `StoreError::DuplicateEmail` if the email is already taken.
    async fn insert(&self, patient: NewPatient) -> StoreResult<Patient>;

    /// Returns every stored patient, in store-defined order.
    async fn find_all(&self) -> StoreResult<Vec<Patient>>;

    async fn find_by_id(&self, id: PatientId) -> StoreResult<Option<Patient>>;

    /// Overwrites the mutable fields of an existing patient.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if the patient no longer exists, `StoreError::DuplicateEmail`
    /// if the new email belongs to another patient.
    async fn update(&self, patient: &Patient) -> StoreResult<Patient>;

    /// Records where the patient stands with the billing system.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if the patient no longer exists.
    async fn set_provisioning_status(
        &self,
        id: PatientId,
        status: ProvisioningStatus,
    ) -> StoreResult<()>;

    /// Deletes a patient. Deleting an unknown id succeeds.
    async fn delete_by_id(&self, id: PatientId) -> StoreResult<()>;

    async fn exists_by_email(&self, email: &EmailAddress) -> StoreResult<bool>;

    async fn exists_by_email_excluding_id(
        &self,
        email: &EmailAddress,
        id: PatientId,
    ) -> StoreResult<bool>;

    /// Number of stored patients.
    async fn count(&self) -> StoreResult<usize> {
        Ok(self.find_all().await?.len())
    }
}
