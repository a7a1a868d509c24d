//! Beacon transport.
//!
//! Implements:
//! - Periodic UDP beacon broadcast of the local availability
//! - Beacon reception, decoding and hand-off to the ingestor

mod beacon;

pub use beacon::BeaconService;
