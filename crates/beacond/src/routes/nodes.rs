//! Membership query endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::state::AppState;
use ohm_discovery::{
    DiscoveryError, DiscoveryModule, MembershipSnapshot, ModuleType, NodeId, NodeInfoRequest,
};

/// Full membership snapshot
pub async fn list_nodes(State(state): State<AppState>) -> Json<MembershipSnapshot> {
    Json(state.discovery.state().await)
}

/// Point query: where does `module` run on `node_id`?
///
/// Returns:
/// - 200: reply, `found = false` when the node or module is unknown
/// - 400: unrecognised module name
/// - 503: request loop stopped
/// - 504: no reply within the request timeout
pub async fn node_module(
    State(state): State<AppState>,
    Path((node_id, module)): Path<(u64, String)>,
) -> Response {
    let module_type = match module.parse::<ModuleType>() {
        Ok(m) => m,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let request = NodeInfoRequest::new(NodeId(node_id), module_type);
    match state.requester.request(request, state.request_timeout).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            tracing::warn!(node_id = node_id, module = %module_type, error = %e, "Node info request failed");
            let status = match e {
                DiscoveryError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            };
            error_response(status, &e)
        }
    }
}

fn error_response(status: StatusCode, error: &DiscoveryError) -> Response {
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
