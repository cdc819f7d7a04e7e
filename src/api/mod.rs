//! API Module
//!
//! HTTP handlers and routing exposing the tiered cache to out-of-process
//! fetchers.
//!
//! # Endpoints
//! - `PUT /cache` - Cache a value under its call arguments
//! - `DELETE /cache` - Clear memory and disk tiers
//! - `POST /cache/lookup` - Retrieve a value by call arguments
//! - `DELETE /cache/memory` - Clear the memory tier
//! - `POST /cache/optimize` - Sweep expired and corrupted disk records
//! - `GET /stats` - Combined cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
