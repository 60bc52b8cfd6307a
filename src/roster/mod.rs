//! The captured roster: the single owner of the persisted list of captures.
//!
//! Every mutation is a read-modify-write against the latest snapshot,
//! serialized by an async write lock, and only becomes visible (to
//! `snapshot()` and to subscribers) after storage confirms the write.

pub mod queries;
mod transfer;

pub use queries::{RosterFilter, SortField, SortOrder};
pub use transfer::{ExportDocument, ImportResult, EXPORT_VERSION};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, RwLock},
};

use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex as AsyncMutex};

use crate::models::{CapturedPokemon, NewCapture, RosterPatch};
use crate::storage::KvStore;

pub const CAPTURED_POKEMONS_KEY: &str = "captured_pokemons";

/// Outcome of a roster mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutation {
    /// Persisted and published.
    Applied,
    /// Nothing to do (duplicate add, unknown id, empty patch).
    Unchanged,
    /// Storage rejected the write; the in-memory roster was left as it was.
    StorageFailed,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub captured_count: usize,
    pub storage_usage: u64,
    pub is_storage_available: bool,
}

type Subscriber = mpsc::UnboundedSender<Vec<CapturedPokemon>>;

struct RosterInner {
    kv: KvStore,
    current: RwLock<Vec<CapturedPokemon>>,
    write_lock: AsyncMutex<()>,
    subscribers: Mutex<Vec<Subscriber>>,
}

#[derive(Clone)]
pub struct RosterStore {
    inner: Arc<RosterInner>,
}

impl RosterStore {
    /// Load the persisted roster; missing or unreadable data starts empty.
    pub async fn load(kv: KvStore) -> Self {
        let roster: Vec<CapturedPokemon> = kv.get(CAPTURED_POKEMONS_KEY, Vec::new()).await;
        info!("Loaded {} captured pokemon", roster.len());

        Self {
            inner: Arc::new(RosterInner {
                kv,
                current: RwLock::new(roster),
                write_lock: AsyncMutex::new(()),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn snapshot(&self) -> Vec<CapturedPokemon> {
        match self.inner.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn get(&self, id: u32) -> Option<CapturedPokemon> {
        self.snapshot().into_iter().find(|pokemon| pokemon.id == id)
    }

    /// Receive the full roster after every successful mutation, in mutation
    /// order. The current roster is delivered first.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Vec<CapturedPokemon>> {
        let (tx, rx) = mpsc::unbounded_channel();

        // Held across the snapshot so no publish can land between the two.
        let mut subscribers = self.lock_subscribers();
        let _ = tx.send(self.snapshot());
        subscribers.push(tx);
        rx
    }

    /// Capture a creature. A second capture of the same id is a no-op and the
    /// original `captured_at` is kept.
    pub async fn add(&self, capture: NewCapture) -> Mutation {
        self.commit(move |roster| {
            if roster.iter().any(|pokemon| pokemon.id == capture.id) {
                return false;
            }
            roster.push(capture.into_captured(Utc::now()));
            true
        })
        .await
    }

    pub async fn remove(&self, id: u32) -> Mutation {
        self.commit(move |roster| {
            let before = roster.len();
            roster.retain(|pokemon| pokemon.id != id);
            roster.len() != before
        })
        .await
    }

    pub async fn update(&self, id: u32, patch: RosterPatch) -> Mutation {
        if patch.is_empty() {
            return Mutation::Unchanged;
        }

        self.commit(move |roster| match roster.iter_mut().find(|pokemon| pokemon.id == id) {
            Some(pokemon) => {
                let before = pokemon.clone();
                patch.apply_to(pokemon);
                *pokemon != before
            }
            None => false,
        })
        .await
    }

    pub async fn clear(&self) -> Mutation {
        let _write = self.inner.write_lock.lock().await;

        if !self.inner.kv.remove(CAPTURED_POKEMONS_KEY).await {
            error!("Failed to clear captured pokemon from storage");
            return Mutation::StorageFailed;
        }

        self.publish(Vec::new());
        Mutation::Applied
    }

    /// Write catalog-derived fields back onto the entries that still exist.
    /// Level and capture time are taken from the live roster, so edits or
    /// removals that happened while details were being fetched survive.
    pub async fn apply_backfill(&self, entries: &[CapturedPokemon]) -> Mutation {
        let by_id: HashMap<u32, &CapturedPokemon> =
            entries.iter().map(|pokemon| (pokemon.id, pokemon)).collect();

        self.commit(move |roster| {
            let mut changed = false;
            for pokemon in roster.iter_mut() {
                if let Some(fresh) = by_id.get(&pokemon.id) {
                    let before = pokemon.clone();
                    pokemon.take_derived_fields(fresh);
                    changed |= *pokemon != before;
                }
            }
            changed
        })
        .await
    }

    pub async fn storage_stats(&self) -> StorageStats {
        StorageStats {
            captured_count: self.snapshot().len(),
            storage_usage: self.inner.kv.usage_bytes().await,
            is_storage_available: self.inner.kv.is_available().await,
        }
    }

    /// Apply `mutate` to a copy of the latest roster; persist and publish it
    /// if `mutate` reports a change.
    async fn commit<F>(&self, mutate: F) -> Mutation
    where
        F: FnOnce(&mut Vec<CapturedPokemon>) -> bool,
    {
        let _write = self.inner.write_lock.lock().await;

        let mut next = self.snapshot();
        if !mutate(&mut next) {
            return Mutation::Unchanged;
        }

        if !self.inner.kv.set(CAPTURED_POKEMONS_KEY, &next).await {
            error!("Could not persist captured pokemon; check available storage");
            return Mutation::StorageFailed;
        }

        self.publish(next);
        Mutation::Applied
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        match self.inner.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Lock order is subscribers, then current; `subscribe` relies on it.
    fn publish(&self, roster: Vec<CapturedPokemon>) {
        let mut subscribers = self.lock_subscribers();
        {
            let mut current = match self.inner.current.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *current = roster.clone();
        }

        subscribers.retain(|tx| tx.send(roster.clone()).is_ok());
    }
}
