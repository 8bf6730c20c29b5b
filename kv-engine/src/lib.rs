//! Concurrent, expiry-aware key-value store.
//!
//! Holds ephemeral per-session material (symmetric keys, presence flags)
//! behind a reader/writer lock, with a min-heap of pending expirations and a
//! short-prefix index for fast prefix queries. Expired entries are dropped
//! lazily on access and in bounded batches by a background reaper task.

mod reaper;
mod store;
mod value;

pub use store::{RemainingTtl, Store, StoreConfig, Ttl};
pub use value::Value;
