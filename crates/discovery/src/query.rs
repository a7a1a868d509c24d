//! Read-side queries against the membership table.

use std::sync::Arc;

use crate::table::{MembershipSnapshot, MembershipTable};
use crate::types::{NodeInfoReply, NodeInfoRequest};

/// Point and snapshot queries
#[derive(Debug, Clone)]
pub struct QueryService {
    table: Arc<MembershipTable>,
}

impl QueryService {
    pub fn new(table: Arc<MembershipTable>) -> Self {
        Self { table }
    }

    /// Resolve a module endpoint on a node.
    ///
    /// An unknown node and a node without the module both answer
    /// [`NodeInfoReply::NOT_FOUND`].
    pub fn node_info(&self, request: &NodeInfoRequest) -> NodeInfoReply {
        let Some(info) = self.table.get(request.node_id) else {
            return NodeInfoReply::NOT_FOUND;
        };

        match info.port_of(request.module_type) {
            Some(port) => NodeInfoReply::found(info.addresses().to_vec(), port),
            None => NodeInfoReply::NOT_FOUND,
        }
    }

    /// Full membership view
    pub async fn state(&self) -> MembershipSnapshot {
        self.table.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Availability, ModuleDescriptor, ModuleType, NodeId, NodeInfo};

    fn service_with_node_7() -> QueryService {
        let table = Arc::new(MembershipTable::new());
        table.upsert(
            NodeId(7),
            Arc::new(NodeInfo::new(Availability {
                addresses: vec!["10.0.0.7".into(), "192.168.1.7".into()],
                modules: vec![ModuleDescriptor {
                    module: ModuleType::Storage,
                    port: 9001,
                }],
            })),
        );
        QueryService::new(table)
    }

    #[test]
    fn test_point_query_hit() {
        let service = service_with_node_7();
        let reply = service.node_info(&NodeInfoRequest::new(NodeId(7), ModuleType::Storage));

        assert!(reply.found);
        assert_eq!(reply.port, 9001);
        assert_eq!(reply.addresses, vec!["10.0.0.7", "192.168.1.7"]);
    }

    #[test]
    fn test_point_query_misses_collapse() {
        let service = service_with_node_7();

        let module_missing = service.node_info(&NodeInfoRequest::new(NodeId(7), ModuleType::Discovery));
        let node_missing = service.node_info(&NodeInfoRequest::new(NodeId(8), ModuleType::Storage));

        assert_eq!(module_missing, NodeInfoReply::NOT_FOUND);
        assert_eq!(node_missing, NodeInfoReply::NOT_FOUND);
    }

    #[test]
    fn test_state_resolves_snapshot() {
        let service = service_with_node_7();
        let snapshot = tokio_test::block_on(service.state());

        assert_eq!(snapshot.node_ids(), vec![NodeId(7)]);
    }
}
