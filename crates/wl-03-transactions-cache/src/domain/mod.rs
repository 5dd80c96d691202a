//! Domain layer for the transactions cache.

pub mod cache;
pub mod entities;
pub mod errors;
pub mod events;
pub mod payment_index;
mod reconcile;
pub mod snapshot;
pub mod value_objects;

pub use cache::TransactionsCache;
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use payment_index::PaymentIndex;
pub use snapshot::{AssetLedgerSnapshot, CacheSnapshot, CACHE_SNAPSHOT_VERSION};
pub use value_objects::*;
