//! # Ports Module
//!
//! Outbound dependencies of the unconfirmed transaction set.

pub mod outbound;

pub use outbound::*;
