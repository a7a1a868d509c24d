//! HTTP admin routes for beacond.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod health;
mod nodes;

/// Create the admin router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))

        // Membership queries
        .route("/nodes", get(nodes::list_nodes))
        .route("/nodes/{node_id}/modules/{module}", get(nodes::node_module))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use ohm_discovery::{Availability, Discovery, ModuleDescriptor, ModuleType, NodeId};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let discovery = Discovery::default();
        discovery.ingestor().ingest(
            NodeId(7),
            Availability {
                addresses: vec!["10.0.0.7".into()],
                modules: vec![ModuleDescriptor {
                    module: ModuleType::Storage,
                    port: 9001,
                }],
            },
        );
        let (requester, _handle) = discovery.serve_requests(8);
        let config = AppConfig {
            node_id: 1,
            ..Default::default()
        };
        create_router(AppState::new(config, discovery, requester))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["node_id"], 1);
        assert_eq!(body["known_nodes"], 1);
    }

    #[tokio::test]
    async fn test_list_nodes() {
        let (status, body) = get_json(app(), "/nodes").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["7"]["modules"]["storage"], 9001);
    }

    #[tokio::test]
    async fn test_node_module_lookup() {
        let (status, body) = get_json(app(), "/nodes/7/modules/storage").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], true);
        assert_eq!(body["port"], 9001);

        let (status, body) = get_json(app(), "/nodes/8/modules/storage").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["found"], false);
        assert_eq!(body["port"], 0);
    }

    #[tokio::test]
    async fn test_unknown_module_is_bad_request() {
        let (status, body) = get_json(app(), "/nodes/7/modules/gpu").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown module type: gpu");
    }
}
