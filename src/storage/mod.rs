//! Persistent key/value adapter.
//!
//! Every operation absorbs storage failures (missing database, write errors,
//! malformed JSON) and degrades to a safe default instead of returning an
//! error. Callers never need to branch on whether storage exists.

use std::{path::PathBuf, time::Duration};

use chrono::{DateTime, Utc};
use log::{error, warn};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::db::Database;

#[derive(Clone)]
pub struct KvStore {
    db: Option<Database>,
}

impl KvStore {
    /// Open (or create) the store at `path`. A database that cannot be opened
    /// yields an unavailable store rather than an error.
    pub fn open(path: PathBuf) -> Self {
        match Database::new(path) {
            Ok(db) => Self { db: Some(db) },
            Err(err) => {
                error!("Key/value storage unavailable, continuing without persistence: {err:#}");
                Self::unavailable()
            }
        }
    }

    /// A store with no backing database; every operation returns its default.
    pub fn unavailable() -> Self {
        Self { db: None }
    }

    pub async fn is_available(&self) -> bool {
        match &self.db {
            Some(db) => match db.ping().await {
                Ok(()) => true,
                Err(err) => {
                    warn!("Storage health check failed: {err:#}");
                    false
                }
            },
            None => false,
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let Some(db) = &self.db else {
            return false;
        };

        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(err) => {
                error!("Failed to serialize value for {key}: {err}");
                return false;
            }
        };

        match db.kv_set(key, &serialized).await {
            Ok(()) => true,
            Err(err) => {
                error!("Failed to write {key} to storage: {err:#}");
                false
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(db) = &self.db else {
            return default;
        };

        let raw = match db.kv_get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(err) => {
                error!("Failed to read {key} from storage: {err:#}");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                error!("Stored value for {key} is malformed, using default: {err}");
                default
            }
        }
    }

    /// Removing a missing key counts as success.
    pub async fn remove(&self, key: &str) -> bool {
        let Some(db) = &self.db else {
            return false;
        };

        match db.kv_delete(key).await {
            Ok(_) => true,
            Err(err) => {
                error!("Failed to remove {key} from storage: {err:#}");
                false
            }
        }
    }

    pub async fn keys_by_prefix(&self, prefix: &str) -> Vec<String> {
        let Some(db) = &self.db else {
            return Vec::new();
        };

        match db.kv_entries_with_prefix(prefix).await {
            Ok(entries) => entries.into_iter().map(|entry| entry.key).collect(),
            Err(err) => {
                error!("Failed to list keys with prefix {prefix}: {err:#}");
                Vec::new()
            }
        }
    }

    /// Remove time-boxed documents under `prefix` whose age has reached `max_age`.
    /// Returns the number of removed keys.
    pub async fn sweep_expired(&self, prefix: &str, max_age: Duration) -> usize {
        self.sweep_expired_at(prefix, max_age, Utc::now()).await
    }

    pub async fn sweep_expired_at(
        &self,
        prefix: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> usize {
        let Some(db) = &self.db else {
            return 0;
        };

        let entries = match db.kv_entries_with_prefix(prefix).await {
            Ok(entries) => entries,
            Err(err) => {
                error!("Failed to scan {prefix} for expired entries: {err:#}");
                return 0;
            }
        };

        let now_ms = now.timestamp_millis();
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let expired: Vec<String> = entries
            .into_iter()
            .filter(|entry| {
                embedded_timestamp_ms(&entry.value)
                    .map(|stamp| now_ms.saturating_sub(stamp) >= max_age_ms)
                    .unwrap_or(false)
            })
            .map(|entry| entry.key)
            .collect();

        if expired.is_empty() {
            return 0;
        }

        match db.kv_delete_many(expired).await {
            Ok(removed) => removed,
            Err(err) => {
                error!("Failed to remove expired entries under {prefix}: {err:#}");
                0
            }
        }
    }

    /// Approximate bytes held by the store; 0 when unavailable.
    pub async fn usage_bytes(&self) -> u64 {
        let Some(db) = &self.db else {
            return 0;
        };

        db.kv_usage().await.unwrap_or_else(|err| {
            error!("Failed to compute storage usage: {err:#}");
            0
        })
    }

    pub async fn clear(&self) -> bool {
        let Some(db) = &self.db else {
            return false;
        };

        match db.kv_clear().await {
            Ok(()) => true,
            Err(err) => {
                error!("Failed to clear storage: {err:#}");
                false
            }
        }
    }
}

/// Epoch-millisecond `builtAt` or `ts` field of a JSON object, if any.
fn embedded_timestamp_ms(raw: &str) -> Option<i64> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let stamp = object.get("builtAt").or_else(|| object.get("ts"))?;
    stamp
        .as_i64()
        .or_else(|| stamp.as_f64().map(|millis| millis as i64))
}
