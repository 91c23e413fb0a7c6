use crate::pb::HealthRes;

/// Simple health service that can be used by both gRPC and REST APIs
///
/// Provides a standardised way to report that a service process is up.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance
    ///
    /// # Arguments
    /// * `service_name` - Name included in the health message, e.g. `"patient-service"`.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health(service_name: &str) -> HealthRes {
        HealthRes {
            ok: true,
            message: format!("{service_name} is alive"),
        }
    }
}
