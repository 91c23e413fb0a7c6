//! Test doubles for the orchestrator's collaborators.
//!
//! These are public so that boundary crates (REST, CLI) can exercise [`crate::PatientService`]
//! without a billing service, a broker or a database.

use crate::billing::{BillingAccount, BillingError, BillingProvisioner, BillingResult};
use crate::events::{EventError, EventPublisher, EventResult, PatientCreatedEvent};
use crate::model::{NewPatient, Patient, PatientId, ProvisioningStatus};
use crate::repositories::{InMemoryPatientStore, PatientStore, StoreError, StoreResult};
use async_trait::async_trait;
use patient_types::EmailAddress;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// How [`MockBillingProvisioner`] answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingMode {
    Succeed,
    Unavailable,
    Rejected,
    /// Never answers; used to exercise the orchestrator's timeout.
    Hang,
}

/// Billing provisioner that counts calls and answers according to its [`BillingMode`].
#[derive(Debug)]
pub struct MockBillingProvisioner {
    mode: Mutex<BillingMode>,
    calls: AtomicUsize,
}

impl MockBillingProvisioner {
    pub fn new(mode: BillingMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(BillingMode::Succeed)
    }

    pub fn set_mode(&self, mode: BillingMode) {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingProvisioner for MockBillingProvisioner {
    async fn provision(
        &self,
        patient_id: PatientId,
        _name: &str,
        _email: &str,
    ) -> BillingResult<BillingAccount> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap_or_else(PoisonError::into_inner);
        match mode {
            BillingMode::Succeed => Ok(BillingAccount {
                account_id: format!("acct-{}", patient_id.uuid().simple()),
                status: "ACTIVE".into(),
            }),
            BillingMode::Unavailable => Err(BillingError::RemoteUnavailable(
                "billing service is down".into(),
            )),
            BillingMode::Rejected => Err(BillingError::RemoteRejected {
                code: "InvalidArgument".into(),
                message: "rejected by mock".into(),
            }),
            BillingMode::Hang => std::future::pending().await,
        }
    }
}

/// Event publisher that records every accepted event.
#[derive(Debug, Default)]
pub struct MockEventPublisher {
    published: Mutex<Vec<(String, PatientCreatedEvent)>>,
    fail: AtomicBool,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose hand-off always fails.
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.set_failing(true);
        publisher
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Accepted events with the topic each was published to.
    pub fn published(&self) -> Vec<(String, PatientCreatedEvent)> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish(&self, topic: &str, event: &PatientCreatedEvent) -> EventResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EventError::PublishFailed {
                topic: topic.to_string(),
                reason: "broker unreachable".into(),
            });
        }
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((topic.to_string(), event.clone()));
        Ok(())
    }
}

/// Store wrapper that can simulate outages and lost uniqueness races.
///
/// With `stale_email_checks` set, the existence queries always answer `false`, as if a
/// concurrent writer slipped in between the check and the write. The wrapped in-memory store
/// still enforces uniqueness on write.
#[derive(Debug, Default)]
pub struct MockPatientStore {
    inner: InMemoryPatientStore,
    fail_writes: AtomicBool,
    stale_email_checks: AtomicBool,
    writes: AtomicUsize,
}

impl MockPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_stale_email_checks(&self, stale: bool) {
        self.stale_email_checks.store(stale, Ordering::SeqCst);
    }

    /// Number of insert, update and delete attempts that reached the store.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn begin_write(&self) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PatientStore for MockPatientStore {
    async fn insert(&self, patient: NewPatient) -> StoreResult<Patient> {
        self.begin_write()?;
        self.inner.insert(patient).await
    }

    async fn find_all(&self) -> StoreResult<Vec<Patient>> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        self.inner.find_by_id(id).await
    }

    async fn update(&self, patient: &Patient) -> StoreResult<Patient> {
        self.begin_write()?;
        self.inner.update(patient).await
    }

    async fn set_provisioning_status(
        &self,
        id: PatientId,
        status: ProvisioningStatus,
    ) -> StoreResult<()> {
        self.inner.set_provisioning_status(id, status).await
    }

    async fn delete_by_id(&self, id: PatientId) -> StoreResult<()> {
        self.begin_write()?;
        self.inner.delete_by_id(id).await
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> StoreResult<bool> {
        if self.stale_email_checks.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.exists_by_email(email).await
    }

    async fn exists_by_email_excluding_id(
        &self,
        email: &EmailAddress,
        id: PatientId,
    ) -> StoreResult<bool> {
        if self.stale_email_checks.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.exists_by_email_excluding_id(email, id).await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.inner.count().await
    }
}
