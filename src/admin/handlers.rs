use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::control_plane::ConnectionState;
use crate::routing::RoutingSnapshot;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub primary_domain: String,
    /// Absent when the control-plane client is disabled.
    pub control_plane: Option<ConnectionState>,
    pub domains: usize,
    pub tenants: Vec<String>,
}

pub async fn get_routing(State(state): State<AdminState>) -> Json<RoutingSnapshot> {
    Json(state.table.snapshot())
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        primary_domain: state.table.primary_domain().to_string(),
        control_plane: state.control_plane.as_ref().map(|rx| *rx.borrow()),
        domains: state.table.domain_count(),
        tenants: state.table.tenant_names(),
    })
}
