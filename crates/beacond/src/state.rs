//! Application state and shared resources.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use ohm_discovery::{Discovery, NodeId, NodeInfoRequester};

/// Deadline for a point query issued by the admin API
const NODE_INFO_TIMEOUT: Duration = Duration::from_millis(500);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// This node's id
    pub node_id: NodeId,

    /// Discovery module (table, ingest, notifications)
    pub discovery: Discovery,

    /// Request/reply client for point queries
    pub requester: NodeInfoRequester,

    /// Deadline applied to `requester` calls
    pub request_timeout: Duration,

    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, discovery: Discovery, requester: NodeInfoRequester) -> Self {
        Self {
            node_id: NodeId(config.node_id),
            config: Arc::new(config),
            discovery,
            requester,
            request_timeout: NODE_INFO_TIMEOUT,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
