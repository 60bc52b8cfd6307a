//! Portable roster document: export to JSON, merge-import from JSON.

use std::collections::HashSet;

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Mutation, RosterStore};
use crate::models::CapturedPokemon;

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: String,
    pub version: String,
    pub captured: Vec<CapturedPokemon>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub message: String,
    pub imported_count: usize,
}

impl ImportResult {
    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            imported_count: 0,
        }
    }

    fn imported(count: usize) -> Self {
        Self {
            success: true,
            message: format!("imported {count} pokemon"),
            imported_count: count,
        }
    }
}

/// The fields every importable entry must carry, with the right JSON types.
fn has_required_shape(entry: &Value) -> bool {
    let Some(object) = entry.as_object() else {
        return false;
    };

    let is_integer = |field: &str| {
        object
            .get(field)
            .map(|value| value.is_i64() || value.is_u64())
            .unwrap_or(false)
    };
    let is_string = |field: &str| object.get(field).map(Value::is_string).unwrap_or(false);

    is_integer("id") && is_string("name") && is_integer("level") && is_string("capturedAt")
}

/// Shape-valid entries of an import document, first occurrence per id.
/// `Err` carries the failure message for a document that cannot be used.
fn parse_entries(json: &str) -> Result<Vec<CapturedPokemon>, &'static str> {
    let document: Value =
        serde_json::from_str(json).map_err(|_| "could not parse import document")?;

    let Some(entries) = document.get("captured").and_then(Value::as_array) else {
        return Err("invalid document format");
    };

    let mut seen = HashSet::new();
    let valid: Vec<CapturedPokemon> = entries
        .iter()
        .filter(|entry| has_required_shape(entry))
        .filter_map(|entry| serde_json::from_value::<CapturedPokemon>(entry.clone()).ok())
        .filter(|pokemon| seen.insert(pokemon.id))
        .collect();

    let dropped = entries.len() - valid.len();
    if dropped > 0 {
        warn!("Skipped {dropped} malformed or duplicate entries in import document");
    }

    if valid.is_empty() {
        return Err("no valid pokemon found in document");
    }
    Ok(valid)
}

impl RosterStore {
    pub fn export_document(&self) -> String {
        let captured = self.snapshot();
        let document = ExportDocument {
            export_date: Utc::now().to_rfc3339(),
            version: EXPORT_VERSION.to_string(),
            total: captured.len(),
            captured,
        };

        serde_json::to_string_pretty(&document).unwrap_or_else(|err| {
            warn!("Failed to serialize export document: {err}");
            String::from("{}")
        })
    }

    /// Merge captures from an exported document. Ids already in the roster are
    /// never overwritten; a valid document with nothing new still succeeds.
    pub async fn import_document(&self, json: &str) -> ImportResult {
        let incoming = match parse_entries(json) {
            Ok(incoming) => incoming,
            Err(message) => {
                warn!("Rejected import document: {message}");
                return ImportResult::failure(message);
            }
        };

        let mut added = 0;
        let outcome = self
            .commit(|roster| {
                let existing: HashSet<u32> = roster.iter().map(|pokemon| pokemon.id).collect();
                for pokemon in incoming {
                    if !existing.contains(&pokemon.id) {
                        roster.push(pokemon);
                        added += 1;
                    }
                }
                added > 0
            })
            .await;

        match outcome {
            Mutation::Applied | Mutation::Unchanged => {
                info!("Imported {added} pokemon");
                ImportResult::imported(added)
            }
            Mutation::StorageFailed => ImportResult::failure("could not save imported pokemon"),
        }
    }
}
