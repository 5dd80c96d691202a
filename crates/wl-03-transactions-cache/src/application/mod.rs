//! Application layer: the lock-guarded service wrapping the cache.

pub mod service;

pub use service::SharedTransactionsCache;
