//! Disk Tier Module
//!
//! One JSON record per key at `<cache_dir>/<digest>.cache`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CacheError, Result};

/// Suffix of every record file.
pub const RECORD_EXTENSION: &str = "cache";

/// Suffix of in-flight writes; never matched as a record.
pub const TEMP_EXTENSION: &str = "tmp";

/// Longest expiry a record is written with. Longer TTLs are clamped.
pub const MAX_RECORD_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Age after which a leftover temporary file is considered abandoned.
const STALE_TEMP_AGE: Duration = Duration::from_secs(15 * 60);

// == Disk Record ==
/// Envelope persisted for each key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskRecord<V> {
    /// The cached payload
    pub data: V,
    /// When the record was written
    pub cached_at: DateTime<Utc>,
    /// Absolute expiry
    pub ttl: DateTime<Utc>,
}

impl<V> DiskRecord<V> {
    /// Wraps `data` with an expiry `ttl` from now, clamped to
    /// `MAX_RECORD_TTL`.
    pub fn new(data: V, ttl: Duration) -> Result<Self> {
        let ttl = ttl.min(MAX_RECORD_TTL);
        let cached_at = Utc::now();
        let expires = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| cached_at.checked_add_signed(ttl))
            .ok_or_else(|| CacheError::InvalidRequest(format!("TTL {ttl:?} is out of range")))?;

        Ok(Self {
            data,
            cached_at,
            ttl: expires,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.ttl
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> Duration {
        (self.ttl - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }
}

// == Disk Lookup ==
/// Outcome of reading a record that did not fail outright.
#[derive(Debug)]
pub enum DiskLookup<V> {
    /// Valid, unexpired record
    Hit(DiskRecord<V>),
    /// No record for the key
    Miss,
    /// Record had expired; its file was removed
    Expired,
}

// == Disk Store ==
/// Directory of record files.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Opens `dir`, creating it and any parents if missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `digest`.
    pub fn path_for(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{digest}.{RECORD_EXTENSION}"))
    }

    // == Load ==
    /// Reads the record for `digest`, deleting it if expired.
    ///
    /// Unreadable or undecodable files are reported as errors and left in
    /// place.
    pub fn load<V: DeserializeOwned>(&self, digest: &str) -> Result<DiskLookup<V>> {
        let path = self.path_for(digest);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DiskLookup::Miss),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let record: DiskRecord<V> =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if record.is_expired() {
            remove_record(&path);
            return Ok(DiskLookup::Expired);
        }

        Ok(DiskLookup::Hit(record))
    }

    // == Store ==
    /// Writes `data` for `digest`, expiring `ttl` from now.
    ///
    /// Each write goes to its own temporary file which is then renamed over
    /// the record, so readers see either the old or the new record.
    pub fn store<V: Serialize>(&self, digest: &str, data: &V, ttl: Duration) -> Result<()> {
        let record = DiskRecord::new(data, ttl)?;
        let bytes =
            serde_json::to_vec(&record).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let path = self.path_for(digest);
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!("{digest}."))
            .suffix(&format!(".{TEMP_EXTENSION}"))
            .tempfile_in(&self.dir)
            .map_err(|e| CacheError::io(&self.dir, e))?;

        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| CacheError::io(tmp.path(), e))?;

        // Dropping the failed handle deletes the temporary file
        tmp.persist(&path)
            .map(|_| ())
            .map_err(|e| CacheError::io(&path, e.error))
    }

    /// Deletes the record for `digest`. Returns whether a file was removed.
    pub fn remove(&self, digest: &str) -> bool {
        remove_record(&self.path_for(digest))
    }

    /// Every `*.cache` file in the directory.
    pub fn record_paths(&self) -> Result<Vec<PathBuf>> {
        self.paths_with_extension(RECORD_EXTENSION)
    }

    fn paths_with_extension(&self, extension: &str) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CacheError::io(&self.dir, e))?.path();
            let matches = path.extension().is_some_and(|ext| ext == extension);
            if matches && path.is_file() {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    // == Clear ==
    /// Deletes every record file. Returns the number removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.record_paths()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io(path, e)),
            }
        }
        Ok(removed)
    }

    // == Sweep ==
    /// Deletes expired and undecodable records, plus temporary files left
    /// behind by interrupted writes. Returns the number removed.
    pub fn sweep(&self) -> Result<usize> {
        let now = Utc::now();
        let mut removed = 0;

        for path in self.record_paths()? {
            let stale = match fs::read(&path) {
                Ok(bytes) => match serde_json::from_slice::<DiskRecord<IgnoredAny>>(&bytes) {
                    Ok(record) => record.is_expired_at(now),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "removing corrupted cache record");
                        true
                    }
                },
                // Deleted concurrently
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "removing unreadable cache record");
                    true
                }
            };

            if stale && remove_record(&path) {
                removed += 1;
            }
        }

        for path in self.paths_with_extension(TEMP_EXTENSION)? {
            if is_abandoned(&path, SystemTime::now()) && remove_record(&path) {
                warn!(path = %path.display(), "removed abandoned temporary file");
                removed += 1;
            }
        }

        Ok(removed)
    }
}

/// Whether a temporary file has not been touched for `STALE_TEMP_AGE`.
fn is_abandoned(path: &Path, now: SystemTime) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .is_some_and(|age| age >= STALE_TEMP_AGE)
}

/// Best-effort delete; returns whether the file is gone because of this call.
fn remove_record(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to delete cache record");
            false
        }
    }
}
