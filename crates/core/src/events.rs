//! Patient domain events.
//!
//! A [`PatientCreatedEvent`] is published once a patient has been stored and provisioned.
//! Publication is a hand-off: [`EventPublisher::publish`] returns as soon as the channel has
//! accepted the event and never waits for consumers.
//!
//! [`KafkaEventPublisher`] is the production channel. It encodes events as protobuf
//! `patient.events.v1.PatientEvent`, keyed by patient id, and enqueues them on an rdkafka
//! producer. The producer's local queue is bounded, so a saturated or unreachable broker turns
//! into an immediate hand-off error rather than a stalled request. Broker delivery is confirmed
//! in the background and only logged.

use crate::constants::PATIENT_CREATED_EVENT_TYPE;
use crate::model::{Patient, PatientId};
use api_shared::events::PatientEvent;
use async_trait::async_trait;
use prost::Message as _;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer as _};
use std::time::Duration;

/// Fact record describing a successfully created patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientCreatedEvent {
    pub patient_id: PatientId,
    pub name: String,
    pub email: String,
}

impl PatientCreatedEvent {
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            patient_id: patient.id,
            name: patient.name.to_string(),
            email: patient.email.to_string(),
        }
    }

    /// Wire form of the event.
    pub fn to_proto(&self) -> PatientEvent {
        PatientEvent {
            patient_id: self.patient_id.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
            event_type: PATIENT_CREATED_EVENT_TYPE.to_string(),
        }
    }

    /// Protobuf-encoded payload.
    pub fn encode(&self) -> Vec<u8> {
        self.to_proto().encode_to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("failed to create event producer: {0}")]
    ConnectionFailed(String),
    #[error("failed to hand off event to topic '{topic}': {reason}")]
    PublishFailed { topic: String, reason: String },
    #[error("queued events were not delivered in time: {0}")]
    FlushFailed(String),
}

pub type EventResult<T> = std::result::Result<T, EventError>;

/// Asynchronous channel for patient events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Hands `event` to the channel for `topic`.
    ///
    /// # Errors
    ///
    /// `EventError::PublishFailed` if the channel did not accept the event.
    async fn publish(&self, topic: &str, event: &PatientCreatedEvent) -> EventResult<()>;
}

/// Kafka-compatible event publisher.
#[derive(Clone)]
pub struct KafkaEventPublisher {
    producer: FutureProducer,
}

impl KafkaEventPublisher {
    /// Creates a producer for `brokers` (comma-separated `host:port` list).
    ///
    /// No connection is made here; librdkafka connects in the background.
    ///
    /// # Errors
    ///
    /// Returns `EventError::ConnectionFailed` if the producer configuration is rejected.
    pub fn new(brokers: &str, delivery_timeout: Duration) -> EventResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set(
                "message.timeout.ms",
                delivery_timeout.as_millis().to_string(),
            )
            .set("acks", "1")
            .create()
            .map_err(|e| EventError::ConnectionFailed(e.to_string()))?;

        tracing::info!(brokers = %brokers, "Kafka event publisher created");

        Ok(Self { producer })
    }

    /// Waits up to `timeout` for queued events to reach the broker.
    ///
    /// Short-lived processes call this before exiting so handed-off events are not dropped.
    ///
    /// # Errors
    ///
    /// Returns `EventError::FlushFailed` if events are still queued when `timeout` expires.
    pub fn flush(&self, timeout: Duration) -> EventResult<()> {
        self.producer
            .flush(timeout)
            .map_err(|e| EventError::FlushFailed(e.to_string()))
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, topic: &str, event: &PatientCreatedEvent) -> EventResult<()> {
        let payload = event.encode();
        let key = event.patient_id.to_string();
        let record = FutureRecord::to(topic)
            .key(key.as_str())
            .payload(payload.as_slice());

        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(kafka_error, _record)| EventError::PublishFailed {
                topic: topic.to_string(),
                reason: kafka_error.to_string(),
            })?;

        let topic = topic.to_string();
        let patient_id = event.patient_id;
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok((partition, offset))) => tracing::debug!(
                    topic = %topic,
                    patient_id = %patient_id,
                    partition,
                    offset,
                    "Patient event delivered"
                ),
                Ok(Err((kafka_error, _message))) => tracing::warn!(
                    topic = %topic,
                    patient_id = %patient_id,
                    error = %kafka_error,
                    "Patient event was not delivered"
                ),
                Err(_canceled) => tracing::warn!(
                    topic = %topic,
                    patient_id = %patient_id,
                    "Patient event delivery was cancelled"
                ),
            }
        });

        Ok(())
    }
}
