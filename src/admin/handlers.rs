use axum::{extract::State, Json};
use serde::Serialize;

use super::AdminState;
use crate::endpoint::Connector;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub endpoints: usize,
    pub strategy: &'static str,
    pub closed: bool,
}

#[derive(Debug, Serialize)]
pub struct EndpointStatus {
    pub address: String,
    pub index: usize,
}

pub async fn get_status<K: Connector>(State(state): State<AdminState<K>>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        endpoints: state.router.len(),
        strategy: state.router.strategy(),
        closed: state.router.is_closed(),
    })
}

pub async fn get_endpoints<K: Connector>(
    State(state): State<AdminState<K>>,
) -> Json<Vec<EndpointStatus>> {
    let mut endpoints: Vec<EndpointStatus> = state
        .router
        .registry()
        .indices()
        .into_iter()
        .map(|(address, index)| EndpointStatus { address, index })
        .collect();
    endpoints.sort_by_key(|e| e.index);

    Json(endpoints)
}
