//! Constants used throughout the patient core crate.
//!
//! Defaults for configuration values live here so that binaries, the CLI and tests agree on
//! them.

/// Default host of the billing gRPC service.
pub const DEFAULT_BILLING_ADDRESS: &str = "localhost";

/// Default port of the billing gRPC service.
pub const DEFAULT_BILLING_GRPC_PORT: u16 = 9001;

/// Default upper bound on a single billing provisioning call, in milliseconds.
pub const DEFAULT_BILLING_TIMEOUT_MS: u64 = 3_000;

/// Default Kafka bootstrap servers.
pub const DEFAULT_KAFKA_BOOTSTRAP_SERVERS: &str = "localhost:9092";

/// Default topic that patient events are published to.
pub const DEFAULT_PATIENT_EVENTS_TOPIC: &str = "patient";

/// Maximum number of characters in a patient name.
pub const MAX_NAME_LEN: usize = 100;

/// Calendar-date format used on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `event_type` value carried by patient-created events.
pub const PATIENT_CREATED_EVENT_TYPE: &str = "PATIENT_CREATED";
