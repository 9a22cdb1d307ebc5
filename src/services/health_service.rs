use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the document store. A failing store only degrades the service: the
/// game keeps running from memory.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store = state.store();
    match store.health_check().await {
        Ok(()) => HealthResponse::ok(store.describe()),
        Err(err) => {
            warn!(backend = store.describe(), error = %err, "storage health check failed");
            HealthResponse::degraded(store.describe())
        }
    }
}
