//! Beacon ingestion.
//!
//! Turns decoded beacons into `NodeInfo`s, installs them in the membership
//! table and announces nodes the table did not hold before. Beacons may arrive
//! concurrently, duplicated and out of order; the table's per-key swap makes
//! the first-sighting decision exactly once per node.

use std::sync::Arc;

use crate::notify::NewNodePublisher;
use crate::table::{MembershipTable, PriorState};
use crate::types::{Availability, NewNodeVisible, NodeId, NodeInfo};

/// How to treat a beacon older than the stored one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Every beacon replaces the stored value
    #[default]
    ReplaceAlways,
    /// Drop beacons whose contact time is older than the stored one
    RejectOlder,
}

/// Result of applying one beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// First sighting, a NewNodeVisible was published
    New,
    /// Replaced an existing entry
    Updated,
    /// Dropped by `StalePolicy::RejectOlder`
    Stale,
}

/// Applies beacons to the membership table
#[derive(Debug, Clone)]
pub struct BeaconIngestor {
    table: Arc<MembershipTable>,
    publisher: NewNodePublisher,
    policy: StalePolicy,
}

impl BeaconIngestor {
    pub fn new(table: Arc<MembershipTable>, publisher: NewNodePublisher, policy: StalePolicy) -> Self {
        Self {
            table,
            publisher,
            policy,
        }
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    /// Apply a beacon received now
    pub fn ingest(&self, node_id: NodeId, availability: Availability) -> IngestOutcome {
        self.ingest_info(node_id, NodeInfo::new(availability))
    }

    /// Apply a beacon with an explicit receipt time (epoch millis)
    pub fn ingest_at(
        &self,
        node_id: NodeId,
        availability: Availability,
        received_at: i64,
    ) -> IngestOutcome {
        self.ingest_info(node_id, NodeInfo::with_contact_time(availability, received_at))
    }

    fn ingest_info(&self, node_id: NodeId, info: NodeInfo) -> IngestOutcome {
        let info = Arc::new(info);

        let prior: PriorState = match self.policy {
            StalePolicy::ReplaceAlways => self.table.upsert(node_id, Arc::clone(&info)),
            StalePolicy::RejectOlder => {
                match self.table.upsert_if_fresher(node_id, Arc::clone(&info)) {
                    Ok(prior) => prior,
                    Err(kept) => {
                        tracing::debug!(
                            node_id = %node_id,
                            stored = kept.last_contact_time(),
                            incoming = info.last_contact_time(),
                            "Dropped stale beacon"
                        );
                        return IngestOutcome::Stale;
                    }
                }
            }
        };

        if prior.existed() {
            tracing::debug!(node_id = %node_id, "Node info refreshed");
            return IngestOutcome::Updated;
        }

        tracing::info!(
            node_id = %node_id,
            modules = info.modules().len(),
            addresses = ?info.addresses(),
            "New node visible"
        );

        self.publisher.publish(NewNodeVisible::new(node_id, info));
        IngestOutcome::New
    }
}
