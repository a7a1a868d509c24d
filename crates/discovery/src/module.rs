//! The discovery module as seen by the rest of the node.
//!
//! [`Discovery`] wires the table, ingestor, publisher and query service
//! together. Other modules program against [`DiscoveryModule`]; callers that
//! want a bounded-latency request/reply exchange use a [`NodeInfoRequester`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::DiscoveryError;
use crate::ingest::{BeaconIngestor, StalePolicy};
use crate::notify::NewNodePublisher;
use crate::query::QueryService;
use crate::table::{MembershipSnapshot, MembershipTable};
use crate::types::{NewNodeVisible, NodeInfoReply, NodeInfoRequest};

/// Cross-module interface to discovery
pub trait DiscoveryModule {
    /// Resolve where `request.module_type` runs on `request.node_id`
    fn node_info(&self, request: &NodeInfoRequest) -> NodeInfoReply;

    /// Whole membership view
    fn state(&self) -> impl Future<Output = MembershipSnapshot> + Send;

    /// Subscribe to first sightings of nodes
    fn new_node_notifications(&self) -> broadcast::Receiver<NewNodeVisible>;
}

type PendingRequest = (NodeInfoRequest, oneshot::Sender<NodeInfoReply>);

/// Discovery module instance
#[derive(Debug, Clone)]
pub struct Discovery {
    table: Arc<MembershipTable>,
    ingestor: BeaconIngestor,
    publisher: NewNodePublisher,
    query: QueryService,
}

impl Discovery {
    pub fn new(policy: StalePolicy, notification_capacity: usize) -> Self {
        let table = Arc::new(MembershipTable::new());
        let publisher = NewNodePublisher::new(notification_capacity);
        let ingestor = BeaconIngestor::new(table.clone(), publisher.clone(), policy);
        let query = QueryService::new(table.clone());

        Self {
            table,
            ingestor,
            publisher,
            query,
        }
    }

    /// Entry point for the beacon transport
    pub fn ingestor(&self) -> &BeaconIngestor {
        &self.ingestor
    }

    pub fn table(&self) -> &Arc<MembershipTable> {
        &self.table
    }

    /// Spawn a task answering node-info requests. It runs until every
    /// requester clone has been dropped.
    pub fn serve_requests(&self, capacity: usize) -> (NodeInfoRequester, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<PendingRequest>(capacity.max(1));
        let query = self.query.clone();

        let handle = tokio::spawn(async move {
            tracing::debug!("Node info request loop started");
            while let Some((request, reply)) = receiver.recv().await {
                // Caller may have timed out and dropped its end
                let _ = reply.send(query.node_info(&request));
            }
            tracing::debug!("Node info request loop stopped");
        });

        (NodeInfoRequester { sender }, handle)
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new(
            StalePolicy::default(),
            crate::constants::DEFAULT_NOTIFICATION_CAPACITY,
        )
    }
}

impl DiscoveryModule for Discovery {
    fn node_info(&self, request: &NodeInfoRequest) -> NodeInfoReply {
        self.query.node_info(request)
    }

    fn state(&self) -> impl Future<Output = MembershipSnapshot> + Send {
        let query = self.query.clone();
        async move { query.state().await }
    }

    fn new_node_notifications(&self) -> broadcast::Receiver<NewNodeVisible> {
        self.publisher.subscribe()
    }
}

/// Client half of the node-info request/reply channel
#[derive(Debug, Clone)]
pub struct NodeInfoRequester {
    sender: mpsc::Sender<PendingRequest>,
}

impl NodeInfoRequester {
    /// Send `request` and wait up to `timeout` for the reply
    pub async fn request(
        &self,
        request: NodeInfoRequest,
        timeout: Duration,
    ) -> Result<NodeInfoReply, DiscoveryError> {
        let exchange = async {
            let (reply_tx, reply_rx) = oneshot::channel();
            self.sender
                .send((request, reply_tx))
                .await
                .map_err(|_| DiscoveryError::ServiceStopped)?;
            let reply = reply_rx.await.map_err(|_| DiscoveryError::ServiceStopped)?;
            Ok::<_, DiscoveryError>(reply)
        };

        tokio::time::timeout(timeout, exchange).await.map_err(|_| {
            DiscoveryError::Timeout(format!(
                "node info for {} after {:?}",
                request.node_id, timeout
            ))
        })?
    }
}
