use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub replies: BTreeMap<&'static str, &'static str>,
}

/// Probes every named backend. Never fails: unreachable backends are
/// reported as `"unavailable"` in the reply map.
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    let mut replies = BTreeMap::new();

    for (name, pinger) in state.pingers.iter() {
        match pinger.ping().await {
            Ok(()) => {
                replies.insert(*name, "ok");
            }
            Err(e) => {
                warn!(service = name, error = %e, "backend is not available");
                replies.insert(*name, "unavailable");
            }
        }
    }

    Json(PingResponse { replies })
}
