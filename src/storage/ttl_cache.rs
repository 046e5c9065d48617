use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{DigestError, DigestResult};

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    cached_at: DateTime<Utc>,
    payload: T,
}

/// Single-payload on-disk cache with a time-to-live.
///
/// `load` returns the payload only while the capture timestamp is within the
/// TTL; `save` overwrites unconditionally and stamps the current time.
pub struct TtlCache {
    path: PathBuf,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(path: impl Into<PathBuf>, ttl_hours: i64) -> Self {
        Self {
            path: path.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Returns the cached payload if present, parseable, and fresh.
    /// A corrupt cache file is treated the same as an absent one.
    pub fn load<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable cache file");
                return None;
            }
        };

        if Utc::now() - envelope.cached_at < self.ttl {
            Some(envelope.payload)
        } else {
            None
        }
    }

    pub fn save<T: Serialize>(&self, payload: &T) -> DigestResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let envelope = Envelope {
            cached_at: Utc::now(),
            payload,
        };
        let json = serde_json::to_string(&envelope)
            .map_err(|e| DigestError::Cache(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
