//! # API Shared
//!
//! Shared utilities and definitions for the patient service APIs.
//!
//! Contains:
//! - Protobuf-generated types (`pb`, `billing`, `events` modules)
//! - Shared services like `HealthService`
//! - API-key checking (usable by both gRPC and REST)
//!
//! Used by `patient-core`, `api-rest` and `billing-grpc`.

// Re-export the generated protobuf modules. The generated code will be placed
// into OUT_DIR at build time by the build script.
pub mod pb {
    tonic::include_proto!("patient.v1");
}

pub mod billing {
    tonic::include_proto!("billing.v1");
}

pub mod events {
    tonic::include_proto!("patient.events.v1");
}

pub mod auth;
pub mod health;

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("proto_descriptor");

pub use health::HealthService;
pub use pb::*;
