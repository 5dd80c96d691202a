//! Ports layer for the transactions cache.
//!
//! - Inbound (Driving) ports: chain-sync notifications
//! - Outbound (Driven) ports: currency rules and snapshot persistence

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
