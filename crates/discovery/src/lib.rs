//! # Ohm Discovery
//!
//! The membership view of an Ohm node: which peers exist, which modules
//! they serve on which ports, and when we last heard from them.
//!
//! ## Modules
//! - `types` - NodeInfo model and the query/notification value types
//! - `table` - Concurrent membership table and frozen snapshots
//! - `ingest` - Applies decoded beacons to the table
//! - `notify` - New-node broadcast to any number of subscribers
//! - `query` - Point and snapshot queries
//! - `module` - The discovery module facade and its request/reply adapter
//! - `error` - Error types
//! - `constants` - Shared defaults

pub mod constants;
pub mod error;
pub mod ingest;
pub mod module;
pub mod notify;
pub mod query;
pub mod table;
pub mod types;

pub use error::DiscoveryError;
pub use ingest::{BeaconIngestor, IngestOutcome, StalePolicy};
pub use module::{Discovery, DiscoveryModule, NodeInfoRequester};
pub use notify::NewNodePublisher;
pub use query::QueryService;
pub use table::{MembershipSnapshot, MembershipTable, PriorState};
pub use types::*;
