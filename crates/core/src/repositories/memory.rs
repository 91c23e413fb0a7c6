//! In-memory patient store.
//!
//! Keeps patients in insertion order behind an async `RwLock`. Uniqueness checks and writes
//! happen under the same write guard, so this store is a faithful backstop for the email
//! invariant even under concurrent requests.

use super::{PatientStore, StoreError, StoreResult};
use crate::model::{NewPatient, Patient, PatientId, ProvisioningStatus};
use async_trait::async_trait;
use patient_types::EmailAddress;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Debug, Default)]
pub struct InMemoryPatientStore {
    patients: Arc<RwLock<Vec<Patient>>>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(patients: &[Patient], email: &EmailAddress, except: Option<PatientId>) -> bool {
    patients
        .iter()
        .any(|p| &p.email == email && Some(p.id) != except)
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn insert(&self, patient: NewPatient) -> StoreResult<Patient> {
        let mut patients = self.patients.write().await;
        if email_taken(&patients, &patient.email, None) {
            return Err(StoreError::DuplicateEmail(patient.email.to_string()));
        }

        let stored = Patient::from_new(PatientId::generate(), patient);
        patients.push(stored.clone());
        Ok(stored)
    }

    async fn find_all(&self) -> StoreResult<Vec<Patient>> {
        Ok(self.patients.read().await.clone())
    }

    async fn find_by_id(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        Ok(self
            .patients
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn update(&self, patient: &Patient) -> StoreResult<Patient> {
        let mut patients = self.patients.write().await;
        if email_taken(&patients, &patient.email, Some(patient.id)) {
            return Err(StoreError::DuplicateEmail(patient.email.to_string()));
        }

        let slot = patients
            .iter_mut()
            .find(|p| p.id == patient.id)
            .ok_or(StoreError::NotFound(patient.id))?;
        slot.name = patient.name.clone();
        slot.email = patient.email.clone();
        slot.address = patient.address.clone();
        slot.date_of_birth = patient.date_of_birth;
        Ok(slot.clone())
    }

    async fn set_provisioning_status(
        &self,
        id: PatientId,
        status: ProvisioningStatus,
    ) -> StoreResult<()> {
        let mut patients = self.patients.write().await;
        let slot = patients
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))?;
        slot.provisioning_status = status;
        Ok(())
    }

    async fn delete_by_id(&self, id: PatientId) -> StoreResult<()> {
        self.patients.write().await.retain(|p| p.id != id);
        Ok(())
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> StoreResult<bool> {
        Ok(email_taken(&self.patients.read().await, email, None))
    }

    async fn exists_by_email_excluding_id(
        &self,
        email: &EmailAddress,
        id: PatientId,
    ) -> StoreResult<bool> {
        Ok(email_taken(&self.patients.read().await, email, Some(id)))
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.patients.read().await.len())
    }
}
