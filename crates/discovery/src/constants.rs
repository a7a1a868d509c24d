//! Shared constants for Ohm discovery components.

/// Default buffered events per new-node subscriber before it starts lagging
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// Default depth of the node-info request queue
pub const DEFAULT_REQUEST_CAPACITY: usize = 1024;

/// Default beacon broadcast interval (seconds)
pub const DEFAULT_BEACON_INTERVAL_SECS: u64 = 2;

/// Default beacon UDP bind address
pub const DEFAULT_BEACON_BIND_ADDR: &str = "0.0.0.0:54333";

/// Default admin HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8890";

/// Default reaper interval (seconds)
pub const DEFAULT_REAP_INTERVAL_SECS: u64 = 5;

/// Largest beacon datagram we accept
pub const MAX_BEACON_SIZE: usize = 8192;
