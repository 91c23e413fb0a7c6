//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.
//!
//! # Environment Variables
//! - `BILLING_SERVICE_ADDRESS`: billing gRPC host (default: `localhost`)
//! - `BILLING_SERVICE_GRPC_PORT`: billing gRPC port (default: `9001`)
//! - `BILLING_TIMEOUT_MS`: upper bound on one provisioning call (default: `3000`)
//! - `BILLING_API_KEY`: sent as `x-api-key` when set
//! - `KAFKA_BOOTSTRAP_SERVERS`: Kafka brokers (default: `localhost:9092`)
//! - `PATIENT_EVENTS_TOPIC`: topic for patient events (default: `patient`)
//! - `DATABASE_URL`: Postgres URL; when unset an in-memory store is used

use crate::constants::{
    DEFAULT_BILLING_ADDRESS, DEFAULT_BILLING_GRPC_PORT, DEFAULT_BILLING_TIMEOUT_MS,
    DEFAULT_KAFKA_BOOTSTRAP_SERVERS, DEFAULT_PATIENT_EVENTS_TOPIC,
};
use crate::{PatientError, PatientResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    billing_address: String,
    billing_port: u16,
    billing_timeout: Duration,
    billing_api_key: Option<String>,
    kafka_bootstrap_servers: String,
    patient_events_topic: String,
    database_url: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            billing_address: DEFAULT_BILLING_ADDRESS.into(),
            billing_port: DEFAULT_BILLING_GRPC_PORT,
            billing_timeout: Duration::from_millis(DEFAULT_BILLING_TIMEOUT_MS),
            billing_api_key: None,
            kafka_bootstrap_servers: DEFAULT_KAFKA_BOOTSTRAP_SERVERS.into(),
            patient_events_topic: DEFAULT_PATIENT_EVENTS_TOPIC.into(),
            database_url: None,
        }
    }
}

impl CoreConfig {
    /// Resolve configuration from the process environment.
    ///
    /// Call once at startup, after `dotenvy::dotenv()`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if a variable is set to an unusable value.
    pub fn from_env() -> PatientResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if a value is unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PatientResult<Self> {
        Ok(Self {
            billing_address: text_from_env_value(
                lookup("BILLING_SERVICE_ADDRESS"),
                DEFAULT_BILLING_ADDRESS,
            ),
            billing_port: port_from_env_value(
                "BILLING_SERVICE_GRPC_PORT",
                lookup("BILLING_SERVICE_GRPC_PORT"),
                DEFAULT_BILLING_GRPC_PORT,
            )?,
            billing_timeout: millis_from_env_value(
                "BILLING_TIMEOUT_MS",
                lookup("BILLING_TIMEOUT_MS"),
                DEFAULT_BILLING_TIMEOUT_MS,
            )?,
            billing_api_key: optional_from_env_value(lookup("BILLING_API_KEY")),
            kafka_bootstrap_servers: text_from_env_value(
                lookup("KAFKA_BOOTSTRAP_SERVERS"),
                DEFAULT_KAFKA_BOOTSTRAP_SERVERS,
            ),
            patient_events_topic: text_from_env_value(
                lookup("PATIENT_EVENTS_TOPIC"),
                DEFAULT_PATIENT_EVENTS_TOPIC,
            ),
            database_url: optional_from_env_value(lookup("DATABASE_URL")),
        })
    }

    /// URI of the billing gRPC endpoint (plaintext).
    pub fn billing_endpoint(&self) -> String {
        format!("http://{}:{}", self.billing_address, self.billing_port)
    }

    pub fn billing_timeout(&self) -> Duration {
        self.billing_timeout
    }

    pub fn billing_api_key(&self) -> Option<&str> {
        self.billing_api_key.as_deref()
    }

    pub fn kafka_bootstrap_servers(&self) -> &str {
        &self.kafka_bootstrap_servers
    }

    pub fn patient_events_topic(&self) -> &str {
        &self.patient_events_topic
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// Replace the database URL. Mainly useful for the CLI's `--database-url` flag.
    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        self.database_url = database_url.or(self.database_url);
        self
    }
}

/// Trimmed value, or `default` when unset or blank.
pub fn text_from_env_value(value: Option<String>, default: &str) -> String {
    optional_from_env_value(value).unwrap_or_else(|| default.to_string())
}

/// Trimmed value, or `None` when unset or blank.
pub fn optional_from_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a TCP port. Zero is rejected.
///
/// # Errors
///
/// Returns `PatientError::InvalidInput` naming `name` if the value is not a port.
pub fn port_from_env_value(name: &str, value: Option<String>, default: u16) -> PatientResult<u16> {
    match optional_from_env_value(value) {
        None => Ok(default),
        Some(v) => match v.parse::<u16>() {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(PatientError::InvalidInput(format!(
                "{name} must be a port number between 1 and 65535, got '{v}'"
            ))),
        },
    }
}

/// Parse a positive number of milliseconds.
///
/// # Errors
///
/// Returns `PatientError::InvalidInput` naming `name` if the value is not a positive integer.
pub fn millis_from_env_value(
    name: &str,
    value: Option<String>,
    default_ms: u64,
) -> PatientResult<Duration> {
    match optional_from_env_value(value) {
        None => Ok(Duration::from_millis(default_ms)),
        Some(v) => match v.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => Err(PatientError::InvalidInput(format!(
                "{name} must be a positive number of milliseconds, got '{v}'"
            ))),
        },
    }
}
