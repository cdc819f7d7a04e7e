//! Request DTOs for the cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::cache::{ttl_from_secs, CacheKey};

/// Arguments of the call being memoized.
///
/// # Fields
/// - `args`: Positional arguments, order matters
/// - `kwargs`: Keyword arguments, order does not matter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyRequest {
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl KeyRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.args.is_empty() && self.kwargs.is_empty() {
            return Some("At least one argument is required".to_string());
        }
        if self.kwargs.keys().any(|name| name.is_empty()) {
            return Some("Keyword argument names cannot be empty".to_string());
        }
        None
    }

    pub fn to_key(&self) -> CacheKey {
        CacheKey::from_parts(self.args.clone(), self.kwargs.clone())
    }
}

/// Request body for storing a value (PUT /cache)
///
/// # Fields
/// - `args`/`kwargs`: Address of the value, as in `KeyRequest`
/// - `data`: The value to cache
/// - `ttl`: Optional TTL in seconds; required for disk persistence
/// - `persist_to_disk`: Whether to write a disk record (default: true)
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    #[serde(flatten)]
    pub key: KeyRequest,
    pub data: Value,
    #[serde(default)]
    pub ttl: Option<f64>,
    #[serde(default = "default_persist")]
    pub persist_to_disk: bool,
}

fn default_persist() -> bool {
    true
}

impl PutRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(message) = self.key.validate() {
            return Some(message);
        }
        if let Some(ttl) = self.ttl {
            if let Err(e) = ttl_from_secs(ttl) {
                return Some(e.to_string());
            }
        }
        None
    }
}
