use serde::Serialize;
use utoipa::ToSchema;

/// Payload of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Viewers currently subscribed to show events.
    pub viewers: usize,
}

impl HealthResponse {
    /// Healthy response reporting `viewers` connected viewers.
    pub fn ok(viewers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            viewers,
        }
    }
}
