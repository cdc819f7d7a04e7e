//! API Handlers
//!
//! HTTP request handlers for each cache endpoint. Cache calls touch the
//! filesystem, so they run on the blocking pool.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::Value;

use crate::cache::{ttl_from_secs, CacheReport, TieredCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, HealthResponse, KeyRequest, LookupResponse, OptimizeResponse, PutRequest,
    PutResponse,
};

/// Cache shared by the HTTP surface; payloads are arbitrary JSON.
pub type SharedCache = Arc<TieredCache<Value>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe tiered cache
    pub cache: SharedCache,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: TieredCache<Value>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Fails if the cache directory cannot be created.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(TieredCache::from_config(config)?))
    }
}

/// Runs `f` against the cache on the blocking pool.
async fn with_cache<T, F>(state: &AppState, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&TieredCache<Value>) -> T + Send + 'static,
{
    let cache = Arc::clone(&state.cache);
    tokio::task::spawn_blocking(move || f(&cache))
        .await
        .map_err(|e| CacheError::Internal(format!("cache task failed: {e}")))
}

/// Handler for PUT /cache
///
/// Stores a value under the key built from `args`/`kwargs`.
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(ttl_from_secs).transpose()?;
    let key = req.key.to_key();
    let digest = key.digest();

    with_cache(&state, move |cache| {
        cache.put(req.data, ttl, req.persist_to_disk, &key)
    })
    .await?;

    Ok(Json(PutResponse::new(digest)))
}

/// Handler for POST /cache/lookup
///
/// Returns the value cached for `args`/`kwargs`, or 404.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<LookupResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let key = req.to_key();
    let digest = key.digest();
    let found = with_cache(&state, move |cache| cache.get(&key)).await?;

    match found {
        Some(data) => Ok(Json(LookupResponse::new(digest, data))),
        None => Err(CacheError::NotFound(digest)),
    }
}

/// Handler for DELETE /cache/memory
pub async fn clear_memory_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    with_cache(&state, |cache| cache.clear_memory()).await?;
    Ok(Json(ClearResponse::new("Memory cache cleared")))
}

/// Handler for DELETE /cache
pub async fn clear_all_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    with_cache(&state, |cache| cache.clear_all()).await?;
    Ok(Json(ClearResponse::new("Memory and disk caches cleared")))
}

/// Handler for POST /cache/optimize
pub async fn optimize_handler(State(state): State<AppState>) -> Result<Json<OptimizeResponse>> {
    let removed = with_cache(&state, |cache| cache.optimize_cache()).await?;
    Ok(Json(OptimizeResponse { removed }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheReport> {
    Json(state.cache.get_cache_stats())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
