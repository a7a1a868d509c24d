//! Configuration management for beacond.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use ohm_discovery::constants::{
    DEFAULT_BEACON_BIND_ADDR, DEFAULT_BEACON_INTERVAL_SECS, DEFAULT_LISTEN_ADDR,
    DEFAULT_NOTIFICATION_CAPACITY, DEFAULT_REAP_INTERVAL_SECS, DEFAULT_REQUEST_CAPACITY,
};
use ohm_discovery::{Availability, DiscoveryError, ModuleDescriptor, StalePolicy};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// This node's id (random if not set)
    #[serde(default = "generate_node_id")]
    pub node_id: u64,

    /// Admin HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Addresses advertised to peers
    #[serde(default)]
    pub addresses: Vec<String>,

    /// Modules this node runs, advertised in every beacon
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,

    /// Beacon transport configuration
    #[serde(default)]
    pub beacon: BeaconConfig,

    /// Membership tracking configuration
    #[serde(default)]
    pub discovery: DiscoverySettings,
}

/// Beacon transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BeaconConfig {
    /// Local bind address for incoming beacons
    #[serde(default = "default_beacon_bind_addr")]
    pub bind_addr: String,

    /// Peer addresses to send beacons to
    #[serde(default)]
    pub peers: Vec<String>,

    /// Broadcast interval in seconds
    #[serde(default = "default_beacon_interval")]
    pub interval_secs: u64,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_beacon_bind_addr(),
            peers: vec![],
            interval_secs: default_beacon_interval(),
        }
    }
}

/// Membership tracking configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    /// Buffered new-node events per subscriber
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    /// Pending node-info requests before senders wait
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,

    /// Drop beacons older than the stored state for that node
    #[serde(default)]
    pub reject_stale_beacons: bool,

    /// Evict nodes silent for this long (0 = never evict)
    #[serde(default)]
    pub node_ttl_secs: u64,

    /// How often the reaper runs
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,
}

impl DiscoverySettings {
    pub fn stale_policy(&self) -> StalePolicy {
        if self.reject_stale_beacons {
            StalePolicy::RejectOlder
        } else {
            StalePolicy::ReplaceAlways
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            notification_capacity: default_notification_capacity(),
            request_capacity: default_request_capacity(),
            reject_stale_beacons: false,
            node_ttl_secs: 0,
            reap_interval_secs: default_reap_interval(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_beacon_bind_addr() -> String { DEFAULT_BEACON_BIND_ADDR.to_string() }
fn default_beacon_interval() -> u64 { DEFAULT_BEACON_INTERVAL_SECS }
fn default_notification_capacity() -> usize { DEFAULT_NOTIFICATION_CAPACITY }
fn default_request_capacity() -> usize { DEFAULT_REQUEST_CAPACITY }
fn default_reap_interval() -> u64 { DEFAULT_REAP_INTERVAL_SECS }

fn generate_node_id() -> u64 {
    use rand::Rng;
    rand::rng().random::<u64>()
}

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(node_id) = args.node_id {
            config.node_id = node_id;
        }
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref bind) = args.beacon_bind {
            config.beacon.bind_addr = bind.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DiscoveryError> {
        if self.beacon.interval_secs == 0 {
            return Err(DiscoveryError::Config(
                "beacon.interval_secs must be at least 1".to_string(),
            ));
        }
        if self.discovery.node_ttl_secs > 0 && self.discovery.reap_interval_secs == 0 {
            return Err(DiscoveryError::Config(
                "discovery.reap_interval_secs must be at least 1 when node_ttl_secs is set"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// What this node announces in its beacons
    pub fn local_availability(&self) -> Availability {
        Availability {
            addresses: self.addresses.clone(),
            modules: self.modules.clone(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: generate_node_id(),
            listen_addr: default_listen_addr(),
            addresses: vec![],
            modules: vec![],
            beacon: BeaconConfig::default(),
            discovery: DiscoverySettings::default(),
        }
    }
}
