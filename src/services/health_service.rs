use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness along with the number of connected viewers.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let snapshot = state.snapshot().await;
    let viewers = state.bus().viewer_count();
    debug!(phase = snapshot.phase.as_str(), viewers, "health check");
    HealthResponse::ok(viewers)
}
