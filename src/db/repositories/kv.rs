use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::Database;

/// One raw row of the key/value table.
#[derive(Debug, Clone)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

fn row_to_entry(row: &Row) -> Result<KvEntry> {
    Ok(KvEntry {
        key: row.get("key")?,
        value: row.get("value")?,
    })
}

impl Database {
    pub async fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .with_context(|| format!("failed to read key {key}"))?;
            Ok(value)
        })
        .await
    }

    pub async fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value)
                 VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("failed to write key {key}"))?;
            Ok(())
        })
        .await
    }

    /// Returns whether a row was actually deleted.
    pub async fn kv_delete(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.execute(move |conn| {
            let rows_affected = conn
                .execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
                .with_context(|| format!("failed to delete key {key}"))?;
            Ok(rows_affected > 0)
        })
        .await
    }

    /// Entries whose key starts with `prefix`, ordered by key.
    /// The comparison is case-sensitive, unlike SQLite's `LIKE`.
    pub async fn kv_entries_with_prefix(&self, prefix: &str) -> Result<Vec<KvEntry>> {
        let prefix = prefix.to_string();
        self.execute(move |conn| {
            let prefix_len = prefix.chars().count() as i64;
            let mut stmt = conn.prepare(
                "SELECT key, value
                 FROM kv_entries
                 WHERE substr(key, 1, ?2) = ?1
                 ORDER BY key ASC",
            )?;

            let mut rows = stmt.query(params![prefix, prefix_len])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }

            Ok(entries)
        })
        .await
    }

    pub async fn kv_delete_many(&self, keys: Vec<String>) -> Result<usize> {
        self.execute(move |conn| {
            let tx = conn.transaction().context("failed to open delete transaction")?;
            let mut removed = 0;
            for key in &keys {
                removed += tx.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
            }
            tx.commit().context("failed to commit delete transaction")?;
            Ok(removed)
        })
        .await
    }

    /// Approximate footprint: the summed character length of every key and value.
    pub async fn kv_usage(&self) -> Result<u64> {
        self.execute(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COALESCE(SUM(length(key) + length(value)), 0) FROM kv_entries",
                [],
                |row| row.get(0),
            )?;
            Ok(total.max(0) as u64)
        })
        .await
    }

    pub async fn kv_clear(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM kv_entries", [])
                .context("failed to clear kv_entries")?;
            Ok(())
        })
        .await
    }

    pub async fn ping(&self) -> Result<()> {
        self.execute(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}
