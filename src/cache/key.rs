//! Cache Key Module
//!
//! Structured keys built from the arguments of the call being memoized.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{CacheError, Result};

/// Separates serialized values inside the digest input. JSON escapes control
/// characters, so it cannot occur inside an encoded value.
const UNIT_SEPARATOR: u8 = 0x1f;
const RECORD_SEPARATOR: u8 = 0x1e;

// == Cache Key ==
/// Address of a cached value in both tiers.
///
/// Positional arguments keep their order; keyword arguments are sorted by
/// name, so the order they are supplied in never changes the key. Values are
/// kept as JSON, so `"1"` and `1` are different keys.
///
/// ```ignore
/// let key = CacheKey::new()
///     .arg(62.0)
///     .arg(-37.0)
///     .kwarg("band", "i")
///     .kwarg("size", 64);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheKey {
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl CacheKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a key from already-decoded arguments.
    pub fn from_parts(
        args: Vec<Value>,
        kwargs: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        Self {
            args,
            kwargs: kwargs.into_iter().collect(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing any earlier value for `name`.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Appends any serializable positional argument.
    pub fn try_arg<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        Ok(self.arg(to_value(value)?))
    }

    /// Sets any serializable keyword argument.
    pub fn try_kwarg<T: Serialize + ?Sized>(
        self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        Ok(self.kwarg(name, to_value(value)?))
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, Value> {
        &self.kwargs
    }

    // == Digest ==
    /// Hex SHA-256 of the canonical encoding; names the disk record too.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();

        hasher.update(b"args");
        for value in &self.args {
            hasher.update([UNIT_SEPARATOR]);
            hasher.update(value.to_string().as_bytes());
        }

        hasher.update([RECORD_SEPARATOR]);
        hasher.update(b"kwargs");
        for (name, value) in &self.kwargs {
            hasher.update([UNIT_SEPARATOR]);
            hasher.update(Value::String(name.clone()).to_string().as_bytes());
            hasher.update([RECORD_SEPARATOR]);
            hasher.update(value.to_string().as_bytes());
        }

        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(Value::to_string).collect();
        let kwargs: Vec<String> = self
            .kwargs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        write!(f, "({})", args.into_iter().chain(kwargs).collect::<Vec<_>>().join(", "))
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| CacheError::Serialization(e.to_string()))
}
