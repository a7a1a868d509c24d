//! UDP Beacon Protocol
//!
//! Every node sends a small JSON packet with its availability to each
//! configured peer on a fixed interval. Receivers decode the packet and hand
//! `(node id, availability)` to the beacon ingestor, stamped at receipt time.
//!
//! Delivery is best effort: datagrams may be lost, duplicated or reordered,
//! which the membership table tolerates.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

use crate::config::BeaconConfig;
use ohm_discovery::constants::MAX_BEACON_SIZE;
use ohm_discovery::{Availability, BeaconIngestor, IngestOutcome, NodeId};

/// Beacon packet sent to peers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BeaconPacket {
    /// Sending node
    pub node_id: NodeId,
    /// Sender's current availability
    pub availability: Availability,
    /// Sender clock at send time (epoch millis), informational only
    pub sent_at: i64,
}

impl BeaconPacket {
    pub fn new(node_id: NodeId, availability: Availability) -> Self {
        Self {
            node_id,
            availability,
            sent_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn decode(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}

/// Beacon sender/receiver for one node
pub struct BeaconService {
    /// Configuration
    config: BeaconConfig,
    /// Our node ID
    node_id: NodeId,
    /// Where decoded beacons go
    ingestor: BeaconIngestor,
}

impl BeaconService {
    pub fn new(config: BeaconConfig, node_id: NodeId, ingestor: BeaconIngestor) -> Self {
        Self {
            config,
            node_id,
            ingestor,
        }
    }

    /// Run the beacon broadcaster
    pub async fn run_broadcaster(
        &self,
        mut local_availability: impl FnMut() -> Availability + Send + 'static,
        mut shutdown: tokio::sync::broadcast::Receiver<()>,
    ) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .context("Failed to bind beacon sender socket")?;

        let peers = self.config.peers.clone();
        let interval = Duration::from_secs(self.config.interval_secs);

        tracing::info!(
            peers = ?peers,
            interval = ?interval,
            "Beacon broadcaster started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let packet = BeaconPacket::new(self.node_id, local_availability());
                    let bytes = match packet.encode() {
                        Ok(b) => b,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize beacon");
                            continue;
                        }
                    };

                    for peer in &peers {
                        if let Err(e) = socket.send_to(&bytes, peer).await {
                            tracing::warn!(peer = %peer, error = %e, "Failed to send beacon");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Beacon broadcaster shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run the beacon receiver
    pub async fn run_receiver(
        &self,
        mut shutdown: tokio::sync::broadcast::Receiver<()>,
    ) -> Result<()> {
        let socket = UdpSocket::bind(&self.config.bind_addr)
            .await
            .context("Failed to bind beacon receiver socket")?;

        let mut buf = vec![0u8; MAX_BEACON_SIZE];

        tracing::info!(addr = %self.config.bind_addr, "Beacon receiver started");

        loop {
            tokio::select! {
                result = socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, addr)) => {
                            self.handle_packet(&buf[..len], addr);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Beacon receive error");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Beacon receiver shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle an incoming datagram. `None` when it was dropped.
    pub fn handle_packet(&self, data: &[u8], addr: SocketAddr) -> Option<IngestOutcome> {
        let packet = match BeaconPacket::decode(data) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(addr = %addr, error = %e, "Invalid beacon packet");
                return None;
            }
        };

        // Don't process our own beacons
        if packet.node_id == self.node_id {
            return None;
        }

        tracing::trace!(
            node = %packet.node_id,
            modules = packet.availability.modules.len(),
            "Received beacon"
        );

        Some(self.ingestor.ingest(packet.node_id, packet.availability))
    }
}
