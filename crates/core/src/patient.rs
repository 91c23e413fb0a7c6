//! Patient lifecycle orchestration.
//!
//! [`PatientService`] coordinates the three collaborators involved in a patient's lifecycle:
//! the [`PatientStore`], the billing system (through a [`BillingProvisioner`]) and the event
//! channel (through an [`EventPublisher`]).
//!
//! Creation runs four strictly sequential steps:
//!
//! 1. reject the request if the email is already in use;
//! 2. insert the patient, letting the store assign the identifier;
//! 3. provision a billing account, bounded by the configured timeout;
//! 4. hand a [`PatientCreatedEvent`] to the event channel.
//!
//! A failure in step 1 or 2 leaves nothing behind. A failure in step 3 leaves the stored
//! patient in place, marked [`ProvisioningStatus::Failed`], and reports
//! [`PatientError::Provisioning`] with its identifier so an operator can reconcile with
//! [`PatientService::retry_provisioning`]. A failure in step 4 is logged and counted but never
//! fails the request.

use crate::billing::{BillingAccount, BillingError, BillingProvisioner, GrpcBillingClient};
use crate::events::{EventPublisher, KafkaEventPublisher, PatientCreatedEvent};
use crate::mapper::{self, to_changes, to_new_patient, to_response};
use crate::model::{Patient, PatientId, ProvisioningStatus};
use crate::repositories::{InMemoryPatientStore, PatientStore, PostgresPatientStore};
use crate::validation::{validate_patient_req, RequestKind};
use crate::{pb, CoreConfig, PatientError, PatientResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Patient lifecycle operations. No transport concerns.
///
/// Cloning is cheap; clones share collaborators and the publication-failure counter.
#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn PatientStore>,
    billing: Arc<dyn BillingProvisioner>,
    events: Arc<dyn EventPublisher>,
    topic: String,
    billing_timeout: Duration,
    publication_failures: Arc<AtomicU64>,
}

impl PatientService {
    /// Creates a service over injected collaborators.
    ///
    /// # Arguments
    ///
    /// * `store` - Durable patient storage.
    /// * `billing` - Client for the billing system.
    /// * `events` - Channel that patient-created events are handed to.
    /// * `topic` - Topic name events are published under.
    /// * `billing_timeout` - Upper bound on a single provisioning call.
    pub fn new(
        store: Arc<dyn PatientStore>,
        billing: Arc<dyn BillingProvisioner>,
        events: Arc<dyn EventPublisher>,
        topic: impl Into<String>,
        billing_timeout: Duration,
    ) -> Self {
        Self {
            store,
            billing,
            events,
            topic: topic.into(),
            billing_timeout,
            publication_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Builds the production collaborators described by `cfg`.
    ///
    /// Uses PostgreSQL (running migrations) when a database URL is configured and an in-memory
    /// store otherwise. The billing channel and the Kafka producer connect lazily, so neither
    /// service has to be up for this to succeed.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Setup` if the database is unreachable, migrations fail, or the
    /// producer configuration is rejected. Returns `PatientError::InvalidInput` for a malformed
    /// billing endpoint or API key.
    pub async fn from_config(cfg: Arc<CoreConfig>) -> PatientResult<Self> {
        let store: Arc<dyn PatientStore> = match cfg.database_url() {
            Some(url) => {
                let store = PostgresPatientStore::connect(url)
                    .await
                    .map_err(|e| PatientError::Setup {
                        component: "patient store",
                        reason: e.to_string(),
                    })?;
                store.migrate().await.map_err(|e| PatientError::Setup {
                    component: "patient store",
                    reason: e.to_string(),
                })?;
                tracing::info!("Using PostgreSQL patient store");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL is not set; patients are kept in memory only");
                Arc::new(InMemoryPatientStore::new())
            }
        };

        let billing = GrpcBillingClient::connect_lazy(&cfg.billing_endpoint(), cfg.billing_api_key())?;

        let events = KafkaEventPublisher::new(cfg.kafka_bootstrap_servers(), cfg.billing_timeout())
            .map_err(|e| PatientError::Setup {
                component: "event publisher",
                reason: e.to_string(),
            })?;

        Ok(Self::new(
            store,
            Arc::new(billing),
            Arc::new(events),
            cfg.patient_events_topic(),
            cfg.billing_timeout(),
        ))
    }

    /// Returns every stored patient in store order.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Persistence` if the store cannot be read.
    pub async fn list(&self) -> PatientResult<Vec<pb::PatientRes>> {
        let patients = self.store.find_all().await?;
        Ok(patients.iter().map(to_response).collect())
    }

    /// Returns a single patient.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if no patient has `id`.
    pub async fn get(&self, id: PatientId) -> PatientResult<pb::PatientRes> {
        let patient = self.find_existing(id).await?;
        Ok(to_response(&patient))
    }

    /// Registers a new patient, provisions billing and announces the creation.
    ///
    /// # Arguments
    ///
    /// * `req` - The registration request. `registeredDate` is required.
    ///
    /// # Returns
    ///
    /// The stored patient in response shape (registration date omitted).
    ///
    /// # Errors
    ///
    /// Returns a `PatientError` if:
    /// - a field is missing or malformed (`Validation`, `InvalidDate`),
    /// - the email is already in use (`DuplicateEmail`),
    /// - the store write fails (`Persistence`),
    /// - billing provisioning fails or times out (`Provisioning`); the patient stays stored.
    pub async fn create(&self, req: &pb::PatientReq) -> PatientResult<pb::PatientRes> {
        validate_patient_req(req, RequestKind::Create)?;
        let new_patient = to_new_patient(req)?;

        if self.store.exists_by_email(&new_patient.email).await? {
            tracing::info!("Rejected patient registration with an email already in use");
            return Err(PatientError::DuplicateEmail(new_patient.email.to_string()));
        }

        let patient = self.store.insert(new_patient).await.map_err(|e| {
            let err = PatientError::from(e);
            if matches!(err, PatientError::Persistence(_)) {
                tracing::error!(error = %err, "Failed to store new patient");
            }
            err
        })?;
        tracing::info!(patient_id = %patient.id, "Patient stored");

        self.provision_and_announce(&patient).await?;

        Ok(to_response(&patient))
    }

    /// Changes a patient's name, email, address and date of birth.
    ///
    /// The registration date is never changed. No billing or event interaction takes place.
    /// An unknown identifier is reported before the email is checked, and a taken email is
    /// reported before the dates are parsed.
    ///
    /// # Errors
    ///
    /// Returns a `PatientError` if:
    /// - a field is missing or malformed (`Validation`, `InvalidDate`),
    /// - no patient has `id` (`NotFound`),
    /// - another patient already uses the email (`DuplicateEmail`),
    /// - the store write fails (`Persistence`).
    pub async fn update(&self, id: PatientId, req: &pb::PatientReq) -> PatientResult<pb::PatientRes> {
        validate_patient_req(req, RequestKind::Update)?;

        let mut patient = self.find_existing(id).await?;

        let email = mapper::email(&req.email)?;
        if self.store.exists_by_email_excluding_id(&email, id).await? {
            return Err(PatientError::DuplicateEmail(email.to_string()));
        }

        let changes = to_changes(req)?;
        patient.apply(changes);
        let updated = self.store.update(&patient).await?;
        tracing::info!(patient_id = %id, "Patient updated");

        Ok(to_response(&updated))
    }

    /// Removes a patient. Deleting an unknown identifier succeeds.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Persistence` if the store write fails.
    pub async fn delete(&self, id: PatientId) -> PatientResult<()> {
        self.store.delete_by_id(id).await?;
        tracing::info!(patient_id = %id, "Patient deleted");
        Ok(())
    }

    /// Re-attempts billing provisioning for a stored patient and, on success, publishes the
    /// creation event that was skipped when provisioning first failed.
    ///
    /// Only patients that are not yet `Active` are retried, so the creation event is published
    /// at most once per successful provisioning. Relies on the billing system returning the
    /// existing account for a patient it already knows.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if no patient has `id`,
    /// `PatientError::AlreadyProvisioned` if the patient's account is already active, and
    /// `PatientError::Provisioning` if billing fails again.
    pub async fn retry_provisioning(&self, id: PatientId) -> PatientResult<BillingAccount> {
        let patient = self.find_existing(id).await?;
        if patient.provisioning_status == ProvisioningStatus::Active {
            return Err(PatientError::AlreadyProvisioned(id));
        }
        tracing::info!(
            patient_id = %id,
            provisioning_status = %patient.provisioning_status,
            "Retrying billing provisioning"
        );
        self.provision_and_announce(&patient).await
    }

    /// Number of events the channel refused since this service was built.
    pub fn publication_failures(&self) -> u64 {
        self.publication_failures.load(Ordering::Relaxed)
    }

    async fn find_existing(&self, id: PatientId) -> PatientResult<Patient> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(PatientError::NotFound(id))
    }

    async fn provision_and_announce(&self, patient: &Patient) -> PatientResult<BillingAccount> {
        let account = match self.provision(patient).await {
            Ok(account) => account,
            Err(source) => {
                tracing::error!(
                    patient_id = %patient.id,
                    error = %source,
                    "Billing provisioning failed; patient remains stored without an account"
                );
                self.record_status(patient.id, ProvisioningStatus::Failed)
                    .await;
                return Err(PatientError::Provisioning {
                    patient_id: patient.id,
                    source,
                });
            }
        };
        tracing::info!(
            patient_id = %patient.id,
            account_id = %account.account_id,
            status = %account.status,
            "Billing account provisioned"
        );

        self.record_status(patient.id, ProvisioningStatus::Active)
            .await;
        self.announce(patient).await;
        Ok(account)
    }

    /// The billing outcome stands whether or not it could be recorded, so a failed write is
    /// logged rather than returned.
    async fn record_status(&self, id: PatientId, status: ProvisioningStatus) {
        if let Err(e) = self.store.set_provisioning_status(id, status).await {
            tracing::error!(
                patient_id = %id,
                provisioning_status = %status,
                error = %e,
                "Failed to record provisioning status"
            );
        }
    }

    async fn provision(&self, patient: &Patient) -> Result<BillingAccount, BillingError> {
        let call = self
            .billing
            .provision(patient.id, patient.name.as_str(), patient.email.as_str());

        match tokio::time::timeout(self.billing_timeout, call).await {
            Ok(result) => result,
            Err(_elapsed) => Err(BillingError::RemoteUnavailable(format!(
                "no response within {} ms",
                self.billing_timeout.as_millis()
            ))),
        }
    }

    async fn announce(&self, patient: &Patient) {
        let event = PatientCreatedEvent::from_patient(patient);
        if let Err(e) = self.events.publish(&self.topic, &event).await {
            let total = self.publication_failures.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                patient_id = %patient.id,
                topic = %self.topic,
                error = %e,
                publication_failures = total,
                "Failed to publish patient created event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{BillingMode, MockBillingProvisioner, MockEventPublisher, MockPatientStore};
    use crate::repositories::PatientStore;

    const TOPIC: &str = "patient";

    struct Harness {
        service: PatientService,
        store: Arc<MockPatientStore>,
        billing: Arc<MockBillingProvisioner>,
        events: Arc<MockEventPublisher>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MockPatientStore::new());
        let billing = Arc::new(MockBillingProvisioner::succeeding());
        let events = Arc::new(MockEventPublisher::new());
        let service = PatientService::new(
            store.clone(),
            billing.clone(),
            events.clone(),
            TOPIC,
            Duration::from_millis(500),
        );
        Harness {
            service,
            store,
            billing,
            events,
        }
    }

    fn ada() -> pb::PatientReq {
        pb::PatientReq {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            address: "1 Infinite Loop".into(),
            date_of_birth: "1990-01-01".into(),
            registered_date: "2024-01-01".into(),
        }
    }

    fn request(name: &str, email: &str) -> pb::PatientReq {
        pb::PatientReq {
            name: name.into(),
            email: email.into(),
            ..ada()
        }
    }

    fn id_of(res: &pb::PatientRes) -> PatientId {
        PatientId::parse(&res.id).expect("response id should be a patient id")
    }

    async fn status_of(h: &Harness, id: PatientId) -> ProvisioningStatus {
        h.store
            .find_by_id(id)
            .await
            .expect("store readable")
            .expect("patient stored")
            .provisioning_status
    }

    #[tokio::test]
    async fn test_create_ada_then_duplicate() {
        let h = harness();

        let created = h.service.create(&ada()).await.expect("create should succeed");
        assert!(!created.id.is_empty());
        assert_eq!(created.name, "Ada");
        assert_eq!(created.email, "ada@example.com");
        assert_eq!(created.address, "1 Infinite Loop");
        assert_eq!(created.date_of_birth, "1990-01-01");

        let stored = h
            .store
            .find_by_id(id_of(&created))
            .await
            .expect("store readable")
            .expect("patient should be stored");
        assert_eq!(stored.email.as_str(), "ada@example.com");

        let err = h
            .service
            .create(&request("Ada Again", "ada@example.com"))
            .await
            .expect_err("duplicate email should be rejected");
        assert!(matches!(err, PatientError::DuplicateEmail(_)));
        assert_eq!(h.store.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_create_publishes_one_event_after_provisioning() {
        let h = harness();

        let created = h.service.create(&ada()).await.expect("create should succeed");

        assert_eq!(h.billing.calls(), 1);
        let published = h.events.published();
        assert_eq!(published.len(), 1);
        let (topic, event) = &published[0];
        assert_eq!(topic, TOPIC);
        assert_eq!(event.patient_id, id_of(&created));
        assert_eq!(event.name, "Ada");
        assert_eq!(event.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_has_no_side_effects() {
        let h = harness();
        h.service.create(&ada()).await.expect("first create");

        let err = h
            .service
            .create(&request("Imposter", "ada@example.com"))
            .await
            .expect_err("should be rejected");

        assert!(matches!(err, PatientError::DuplicateEmail(ref e) if e == "ada@example.com"));
        assert_eq!(h.store.writes(), 1);
        assert_eq!(h.billing.calls(), 1);
        assert_eq!(h.events.published().len(), 1);
    }

    #[tokio::test]
    async fn test_store_constraint_catches_lost_race() {
        let h = harness();
        h.service.create(&ada()).await.expect("first create");
        h.store.set_stale_email_checks(true);

        let err = h
            .service
            .create(&request("Racer", "ada@example.com"))
            .await
            .expect_err("store should reject the duplicate");

        assert!(matches!(err, PatientError::DuplicateEmail(_)));
        assert_eq!(h.store.count().await.expect("count"), 1);
        assert_eq!(h.billing.calls(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_stops_before_billing() {
        let h = harness();
        h.store.set_fail_writes(true);

        let err = h.service.create(&ada()).await.expect_err("store is down");

        assert!(matches!(err, PatientError::Persistence(_)));
        assert_eq!(h.billing.calls(), 0);
        assert!(h.events.published().is_empty());
    }

    #[tokio::test]
    async fn test_billing_failure_keeps_patient_and_skips_event() {
        let h = harness();
        h.billing.set_mode(BillingMode::Rejected);

        let err = h.service.create(&ada()).await.expect_err("billing rejects");

        let (patient_id, source) = match err {
            PatientError::Provisioning { patient_id, source } => (patient_id, source),
            other => panic!("expected a provisioning failure, got {other:?}"),
        };
        assert!(matches!(source, BillingError::RemoteRejected { .. }));
        assert!(h
            .store
            .find_by_id(patient_id)
            .await
            .expect("store readable")
            .is_some());
        assert!(h.events.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_billing_timeout_is_unavailable() {
        let h = harness();
        h.billing.set_mode(BillingMode::Hang);

        let err = h.service.create(&ada()).await.expect_err("billing hangs");

        assert!(matches!(
            err,
            PatientError::Provisioning {
                source: BillingError::RemoteUnavailable(_),
                ..
            }
        ));
        assert_eq!(h.store.count().await.expect("count"), 1);
        assert!(h.events.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_is_counted_not_returned() {
        let h = harness();
        h.events.set_failing(true);

        let created = h.service.create(&ada()).await.expect("create still succeeds");

        assert_eq!(created.email, "ada@example.com");
        assert_eq!(h.service.publication_failures(), 1);
        assert!(h.events.published().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_the_store() {
        let h = harness();

        let err = h
            .service
            .create(&pb::PatientReq {
                registered_date: String::new(),
                ..ada()
            })
            .await
            .expect_err("registered date is required on create");
        assert!(matches!(err, PatientError::Validation(_)));

        let err = h
            .service
            .create(&pb::PatientReq {
                date_of_birth: "1990-13-45".into(),
                ..ada()
            })
            .await
            .expect_err("date must be a calendar date");
        assert!(matches!(err, PatientError::InvalidDate { .. }));

        assert_eq!(h.store.writes(), 0);
        assert_eq!(h.billing.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_unknown_patient_is_not_found() {
        let h = harness();
        let ghost = PatientId::generate();

        let err = h
            .service
            .update(ghost, &ada())
            .await
            .expect_err("nobody to update");

        assert!(matches!(err, PatientError::NotFound(id) if id == ghost));
        assert_eq!(h.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_update_unknown_patient_wins_over_bad_date() {
        let h = harness();
        let ghost = PatientId::generate();

        let err = h
            .service
            .update(
                ghost,
                &pb::PatientReq {
                    date_of_birth: "garbage".into(),
                    ..ada()
                },
            )
            .await
            .expect_err("nobody to update");

        assert!(matches!(err, PatientError::NotFound(id) if id == ghost));
    }

    #[tokio::test]
    async fn test_update_taken_email_wins_over_bad_date() {
        let h = harness();
        let ada_res = h.service.create(&ada()).await.expect("create ada");
        h.service
            .create(&request("Bob", "bob@example.com"))
            .await
            .expect("create bob");

        let err = h
            .service
            .update(
                id_of(&ada_res),
                &pb::PatientReq {
                    date_of_birth: "garbage".into(),
                    ..request("Ada", " bob@example.com ")
                },
            )
            .await
            .expect_err("bob's email is taken");

        assert!(matches!(err, PatientError::DuplicateEmail(ref e) if e == "bob@example.com"));
        assert_eq!(h.store.writes(), 2);
    }

    #[tokio::test]
    async fn test_update_email_uniqueness_excludes_self() {
        let h = harness();
        let ada_res = h.service.create(&ada()).await.expect("create ada");
        h.service
            .create(&request("Bob", "bob@example.com"))
            .await
            .expect("create bob");
        let ada_id = id_of(&ada_res);

        let err = h
            .service
            .update(ada_id, &request("Ada", "bob@example.com"))
            .await
            .expect_err("bob's email is taken");
        assert!(matches!(err, PatientError::DuplicateEmail(_)));

        let updated = h
            .service
            .update(
                ada_id,
                &pb::PatientReq {
                    address: "2 Infinite Loop".into(),
                    registered_date: String::new(),
                    ..ada()
                },
            )
            .await
            .expect("own email is fine and registered date is optional");
        assert_eq!(updated.id, ada_res.id);
        assert_eq!(updated.address, "2 Infinite Loop");
        assert_eq!(h.billing.calls(), 2);
        assert_eq!(h.events.published().len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_registered_date() {
        let h = harness();
        let created = h.service.create(&ada()).await.expect("create");
        let id = id_of(&created);

        h.service
            .update(
                id,
                &pb::PatientReq {
                    registered_date: "2030-06-06".into(),
                    ..ada()
                },
            )
            .await
            .expect("update");

        let stored = h
            .store
            .find_by_id(id)
            .await
            .expect("store readable")
            .expect("still stored");
        assert_eq!(
            stored.registered_date,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let h = harness();
        let created = h.service.create(&ada()).await.expect("create");
        let id = id_of(&created);

        h.service.delete(id).await.expect("first delete");
        h.service.delete(id).await.expect("second delete");
        h.service
            .delete(PatientId::generate())
            .await
            .expect("unknown id");

        assert!(h.service.list().await.expect("list").is_empty());
        assert!(matches!(
            h.service.get(id).await,
            Err(PatientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_returns_store_order() {
        let h = harness();
        h.service.create(&ada()).await.expect("ada");
        h.service
            .create(&request("Bob", "bob@example.com"))
            .await
            .expect("bob");

        let names: Vec<String> = h
            .service
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Ada", "Bob"]);
    }

    #[tokio::test]
    async fn test_retry_provisioning_after_failure() {
        let h = harness();
        h.billing.set_mode(BillingMode::Unavailable);
        let err = h.service.create(&ada()).await.expect_err("billing down");
        let patient_id = match err {
            PatientError::Provisioning { patient_id, .. } => patient_id,
            other => panic!("expected a provisioning failure, got {other:?}"),
        };

        h.billing.set_mode(BillingMode::Succeed);
        let account = h
            .service
            .retry_provisioning(patient_id)
            .await
            .expect("retry should succeed");

        assert_eq!(account.status, "ACTIVE");
        assert_eq!(h.events.published().len(), 1);
        assert_eq!(h.events.published()[0].1.patient_id, patient_id);
    }

    #[tokio::test]
    async fn test_provisioning_status_follows_billing_outcome() {
        let h = harness();
        h.billing.set_mode(BillingMode::Rejected);
        let err = h.service.create(&ada()).await.expect_err("billing rejects");
        let patient_id = match err {
            PatientError::Provisioning { patient_id, .. } => patient_id,
            other => panic!("expected a provisioning failure, got {other:?}"),
        };
        assert_eq!(status_of(&h, patient_id).await, ProvisioningStatus::Failed);

        h.billing.set_mode(BillingMode::Unavailable);
        h.service
            .retry_provisioning(patient_id)
            .await
            .expect_err("billing still down");
        assert_eq!(status_of(&h, patient_id).await, ProvisioningStatus::Failed);

        h.billing.set_mode(BillingMode::Succeed);
        h.service
            .retry_provisioning(patient_id)
            .await
            .expect("retry succeeds");
        assert_eq!(status_of(&h, patient_id).await, ProvisioningStatus::Active);
    }

    #[tokio::test]
    async fn test_retry_on_provisioned_patient_does_not_announce_again() {
        let h = harness();
        let created = h.service.create(&ada()).await.expect("create");
        let id = id_of(&created);

        let err = h
            .service
            .retry_provisioning(id)
            .await
            .expect_err("already provisioned");

        assert!(matches!(err, PatientError::AlreadyProvisioned(p) if p == id));
        assert_eq!(h.billing.calls(), 1);
        assert_eq!(h.events.published().len(), 1);

        let err = h
            .service
            .retry_provisioning(id)
            .await
            .expect_err("still provisioned");
        assert!(matches!(err, PatientError::AlreadyProvisioned(_)));
        assert_eq!(h.events.published().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_provisioning_unknown_patient() {
        let h = harness();
        let err = h
            .service
            .retry_provisioning(PatientId::generate())
            .await
            .expect_err("nobody to provision");
        assert!(matches!(err, PatientError::NotFound(_)));
        assert_eq!(h.billing.calls(), 0);
    }
}
