/// Metadata key carrying the shared API key on gRPC calls.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Validates the provided API key against the expected key.
///
/// The expected key is resolved once at startup by the caller; this function never reads the
/// environment.
///
/// Returns `Ok(())` if the key matches, or `unauthenticated` otherwise.
#[allow(clippy::result_large_err)]
pub fn validate_api_key(provided_key: &str, expected_key: &str) -> Result<(), tonic::Status> {
    if !expected_key.is_empty() && provided_key == expected_key {
        Ok(())
    } else {
        Err(tonic::Status::unauthenticated("Invalid API key"))
    }
}
