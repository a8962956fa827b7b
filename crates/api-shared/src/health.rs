use crate::messages::HealthRes;

/// Simple health service shared by the REST binaries.
///
/// This service provides a standardised way to check the health status of the SGA service.
#[derive(Clone, Copy, Debug)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "SGA assessment service is alive".into(),
        }
    }
}
