//! # Patient Core
//!
//! Core business logic for the patient lifecycle service.
//!
//! This crate contains the patient domain and the orchestration around it:
//! - Patient registration, update, listing and removal ([`PatientService`])
//! - Billing account provisioning over gRPC ([`billing`])
//! - Patient-created events published to Kafka ([`events`])
//! - Patient storage in PostgreSQL or in memory ([`repositories`])
//!
//! **No API concerns**: HTTP routing, status codes and server setup belong in `api-rest`,
//! `billing-grpc`, or the binaries.

pub mod billing;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod mapper;
pub mod mocks;
pub mod model;
pub mod patient;
pub mod repositories;
pub mod validation;

// Use the shared api-shared crate for generated protobuf types.
pub use api_shared::pb;

pub use billing::{BillingAccount, BillingError, BillingProvisioner, GrpcBillingClient};
pub use config::CoreConfig;
pub use error::{PatientError, PatientResult};
pub use events::{EventError, EventPublisher, KafkaEventPublisher, PatientCreatedEvent};
pub use model::{NewPatient, Patient, PatientChanges, PatientId, ProvisioningStatus};
pub use patient::PatientService;
pub use repositories::{InMemoryPatientStore, PatientStore, PostgresPatientStore, StoreError};
pub use validation::FieldErrors;
