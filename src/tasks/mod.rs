//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the service is up.
//!
//! # Tasks
//! - Cache optimization: drops expired memory entries and sweeps expired or
//!   corrupted disk records at configured intervals

mod optimize;

pub use optimize::spawn_optimize_task;
