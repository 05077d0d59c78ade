//! Per-table accumulator of action keys.
//!
//! Coalesces many fine-grained mutations into one set of table-scope keys
//! per coalescing window, so notification volume is bounded by the number
//! of dirty tables rather than by the number of ops.
//!
//! # Concurrency
//!
//! Each table owns its own mutex. Inserts for the same table serialize on
//! it; inserts for different tables only share a read lock on the registry.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::{DomainError, TableId};

use super::action::{ActionTrigger, TableActionKey};

type Slot = Arc<Mutex<BTreeSet<TableActionKey>>>;

/// De-duplicating action-trigger buffer keyed by table.
#[derive(Default)]
pub struct ActionTriggerBuffer {
    tables: RwLock<HashMap<TableId, Slot>>,
}

impl ActionTriggerBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `key` against the table-scope set, then buffers it.
    ///
    /// # Errors
    ///
    /// `InvalidActionKey` if `key` is not a table-scope key. Nothing is
    /// buffered in that case.
    pub async fn push(&self, table_id: &TableId, key: &str) -> Result<(), DomainError> {
        let key: TableActionKey = key.parse()?;
        self.push_key(table_id, key).await;
        Ok(())
    }

    /// Buffers an already-typed key.
    pub async fn push_key(&self, table_id: &TableId, key: TableActionKey) {
        let slot = self.slot(table_id).await;
        let inserted = slot.lock().await.insert(key);
        if inserted {
            tracing::trace!(table_id = %table_id, action = %key, "Buffered action key");
        }
    }

    /// Current keys for a table without draining them.
    pub async fn pending(&self, table_id: &TableId) -> Vec<TableActionKey> {
        let slot = self.tables.read().await.get(table_id).cloned();
        match slot {
            Some(slot) => slot.lock().await.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Takes the keys for one table, closing its window.
    ///
    /// Returns `None` when nothing is buffered.
    pub async fn drain(&self, table_id: &TableId) -> Option<ActionTrigger> {
        let slot = self.tables.read().await.get(table_id).cloned()?;
        let actions = std::mem::take(&mut *slot.lock().await);
        to_trigger(table_id.clone(), actions)
    }

    /// Takes the keys of every dirty table, ordered by table id.
    pub async fn drain_all(&self) -> Vec<ActionTrigger> {
        let mut slots: Vec<(TableId, Slot)> = self
            .tables
            .read()
            .await
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();
        slots.sort_by(|a, b| a.0.cmp(&b.0));

        let mut triggers = Vec::new();
        for (table_id, slot) in slots {
            let actions = std::mem::take(&mut *slot.lock().await);
            if let Some(trigger) = to_trigger(table_id, actions) {
                triggers.push(trigger);
            }
        }

        self.prune().await;
        triggers
    }

    /// Number of tables with a registered slot.
    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    async fn slot(&self, table_id: &TableId) -> Slot {
        if let Some(slot) = self.tables.read().await.get(table_id) {
            return Arc::clone(slot);
        }
        let mut tables = self.tables.write().await;
        Arc::clone(tables.entry(table_id.clone()).or_default())
    }

    /// Drops empty slots nobody else holds.
    ///
    /// A slot cloned by an in-flight `push_key` has a strong count above one
    /// and is kept, so a concurrent insert can never land in an orphan.
    async fn prune(&self) {
        let mut tables = self.tables.write().await;
        tables.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(actions) => !actions.is_empty(),
                Err(_) => true,
            }
        });
    }
}

fn to_trigger(table_id: TableId, actions: BTreeSet<TableActionKey>) -> Option<ActionTrigger> {
    if actions.is_empty() {
        return None;
    }
    Some(ActionTrigger {
        table_id,
        actions: actions.into_iter().collect(),
    })
}
