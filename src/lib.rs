//! RIPPLe cutout cache
//!
//! Tiered memoization for expensive cutout retrieval: a bounded LRU memory
//! store with TTL expiry in front of a TTL-aware disk tier, plus an HTTP
//! surface for out-of-process callers.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheKey, TieredCache};
pub use config::Config;
pub use error::CacheError;
pub use tasks::spawn_optimize_task;
