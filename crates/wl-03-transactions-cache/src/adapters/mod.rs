//! Adapters layer for the transactions cache.
//!
//! - `codec`: bincode and JSON snapshot codecs
//! - `store`: in-memory and file snapshot stores
//! - `currency`: simple-interest currency rules

pub mod codec;
pub mod currency;
pub mod store;

pub use codec::{BincodeCodec, JsonCodec};
pub use currency::SimpleInterestCurrency;
pub use store::{FileSnapshotStore, InMemorySnapshotStore};
