use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service shared by every API front end.
///
/// This service provides a standardised way to check the health status of the admission
/// portal. It can be used both as a static utility and as an instantiated service.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Admission portal is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_serializes_as_ok_and_message() {
        let json = serde_json::to_value(HealthService::check_health()).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["message"], "Admission portal is alive");
    }
}
