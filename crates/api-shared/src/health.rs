use crate::schema::{HealthRes, ServiceInfoRes};

/// Simple health service shared by the single-shot and streaming APIs
///
/// Provides a standardised way to report liveness without touching any dependency, so a
/// service missing its model credential still reports healthy.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Health response for `service`.
    ///
    /// # Arguments
    /// * `service` - Human-readable service name, e.g. "Agents REST API"
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health(service: &str) -> HealthRes {
        HealthRes {
            ok: true,
            message: format!("{service} is alive"),
        }
    }

    /// Identity response served at `/`.
    pub fn service_info(service: &str) -> ServiceInfoRes {
        ServiceInfoRes {
            service: service.to_string(),
            status: "running".into(),
        }
    }
}
