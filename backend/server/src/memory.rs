//! Process-local entry store. Used for local runs without Redis and by the test-suite.
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    entry::{Entry, EntryId, FieldUpdate},
    error::AppError,
    store::{EntryStore, UpdateOutcome},
};

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<EntryId, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn insert(&self, entry: &Entry) -> Result<(), AppError> {
        self.entries.write().insert(entry.id, entry.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Entry>, AppError> {
        Ok(self.entries.read().values().cloned().collect())
    }

    async fn get(&self, id: EntryId) -> Result<Option<Entry>, AppError> {
        Ok(self.entries.read().get(&id).cloned())
    }

    async fn update(
        &self,
        id: EntryId,
        changes: &[FieldUpdate],
    ) -> Result<UpdateOutcome, AppError> {
        let mut entries = self.entries.write();

        let Some(entry) = entries.get_mut(&id) else {
            return Ok(UpdateOutcome::NoMatch);
        };

        let mut modified = false;
        for change in changes {
            modified |= entry.apply(change);
        }

        Ok(UpdateOutcome::Matched {
            modified: u64::from(modified),
        })
    }

    async fn delete(&self, id: EntryId) -> Result<u64, AppError> {
        Ok(u64::from(self.entries.write().remove(&id).is_some()))
    }
}
