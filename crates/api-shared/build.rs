//! Build script for the `api-shared` crate.
//!
//! ## Purpose
//! Generates Rust protobuf types from the files under `proto/` and emits a file-descriptor set.
//!
//! ## Intended use
//! - `patient.v1` types double as the REST request/response bodies, so they also derive serde
//!   (camelCase on the wire) and `utoipa::ToSchema`.
//! - `billing.v1` produces both the server trait (billing service) and the client (patient
//!   service).
//! - `patient.events.v1` is the payload published to the patient topic.
//!
//! The descriptor set is used for gRPC reflection.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let proto_root = manifest_dir.join("proto");
    let proto_files = [
        proto_root.join("patient.proto"),
        proto_root.join("billing.proto"),
        proto_root.join("patient_event.proto"),
    ];

    for proto_file in &proto_files {
        println!("cargo:rerun-if-changed={}", proto_file.display());
    }

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .type_attribute(
            ".",
            "#[derive(serde::Serialize, serde::Deserialize, utoipa::ToSchema)]",
        )
        .type_attribute(".patient.v1", "#[serde(rename_all = \"camelCase\", default)]")
        .file_descriptor_set_path(
            std::path::Path::new(&std::env::var("OUT_DIR")?).join("proto_descriptor.bin"),
        )
        .compile_protos(&proto_files, &[proto_root.as_path()])?;

    Ok(())
}
