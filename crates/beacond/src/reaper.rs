//! Stale node eviction.
//!
//! Removes peers whose last beacon is older than the configured TTL. A node
//! that beacons again after eviction is announced as new.

use std::sync::Arc;
use std::time::Duration;

use ohm_discovery::{MembershipTable, NodeId};

/// Evict nodes last contacted more than `ttl` before `now` (epoch millis)
pub fn reap_once(table: &MembershipTable, ttl: Duration, now: i64) -> Vec<NodeId> {
    // TTLs beyond i64 millis mean "never"
    let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    let cutoff = now.saturating_sub(ttl_millis);
    let evicted = table.evict_older_than(cutoff);

    for node_id in &evicted {
        tracing::warn!(node_id = %node_id, ttl = ?ttl, "Node evicted (no beacon)");
    }
    if !evicted.is_empty() {
        tracing::info!(remaining = table.len(), "Cluster size now");
    }

    evicted
}

/// Run the reaper until shutdown
pub async fn run_reaper(
    table: Arc<MembershipTable>,
    ttl: Duration,
    every: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    tracing::info!(ttl = ?ttl, interval = ?every, "Node reaper started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(every) => {
                reap_once(&table, ttl, chrono::Utc::now().timestamp_millis());
            }
            _ = shutdown.recv() => {
                tracing::info!("Node reaper shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohm_discovery::{Availability, NodeInfo};

    #[test]
    fn test_reap_once_evicts_silent_nodes() {
        let table = MembershipTable::new();
        table.upsert(
            NodeId(1),
            Arc::new(NodeInfo::with_contact_time(Availability::default(), 1_000)),
        );
        table.upsert(
            NodeId(2),
            Arc::new(NodeInfo::with_contact_time(Availability::default(), 25_000)),
        );

        let evicted = reap_once(&table, Duration::from_secs(10), 30_000);

        assert_eq!(evicted, vec![NodeId(1)]);
        assert!(table.contains(NodeId(2)));
    }

    #[test]
    fn test_huge_ttl_keeps_nodes() {
        let table = MembershipTable::new();
        table.upsert(
            NodeId(1),
            Arc::new(NodeInfo::with_contact_time(Availability::default(), 30_000)),
        );

        let evicted = reap_once(&table, Duration::from_secs(u64::MAX), 30_000);

        assert!(evicted.is_empty());
        assert!(table.contains(NodeId(1)));
    }

    #[tokio::test]
    async fn test_reaper_stops_on_shutdown() {
        let (tx, rx) = tokio::sync::broadcast::channel(1);
        let handle = tokio::spawn(run_reaper(
            Arc::new(MembershipTable::new()),
            Duration::from_secs(10),
            Duration::from_secs(3600),
            rx,
        ));

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
