use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::info;

use crate::{
    entry::{Entry, EntryId, FieldUpdate, NewEntry},
    error::AppError,
    store::{EntryStore, UpdateOutcome},
};

/// Entry operations bounded by a per-call timeout.
#[derive(Clone)]
pub struct EntryRepository {
    store: Arc<dyn EntryStore>,
    timeout: Duration,
}

impl EntryRepository {
    pub fn new(store: Arc<dyn EntryStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn create(&self, draft: NewEntry) -> Result<Entry, AppError> {
        let entry = draft.into_entry()?;

        self.bounded(self.store.insert(&entry)).await?;
        info!("Created entry {}", entry.id);

        Ok(entry)
    }

    pub async fn list_all(&self) -> Result<Vec<Entry>, AppError> {
        self.bounded(self.store.list()).await
    }

    pub async fn get_by_id(&self, id: EntryId) -> Result<Entry, AppError> {
        self.bounded(self.store.get(id))
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn list_by_ingredient(&self, ingredient: &str) -> Result<Vec<Entry>, AppError> {
        self.bounded(self.store.find_by_ingredient(ingredient)).await
    }

    /// Overwrites only the given fields. Returns the modified count, 0 when every value was
    /// already stored.
    pub async fn update_partial(
        &self,
        id: EntryId,
        changes: &[FieldUpdate],
    ) -> Result<u64, AppError> {
        if changes.is_empty() {
            return Err(AppError::ValidationFailure(
                "update must set at least one field".to_string(),
            ));
        }

        match self.bounded(self.store.update(id, changes)).await? {
            UpdateOutcome::NoMatch => Err(AppError::NotFound),
            UpdateOutcome::Matched { modified } => {
                info!("Updated entry {id} ({modified} modified)");
                Ok(modified)
            }
        }
    }

    pub async fn update_ingredients(
        &self,
        id: EntryId,
        ingredients: Vec<String>,
    ) -> Result<u64, AppError> {
        self.update_partial(id, &[FieldUpdate::Ingredients(ingredients)])
            .await
    }

    pub async fn delete_by_id(&self, id: EntryId) -> Result<u64, AppError> {
        let deleted = self.bounded(self.store.delete(id)).await?;
        info!("Deleted entry {id} ({deleted} removed)");

        Ok(deleted)
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        timeout(self.timeout, operation)
            .await
            .map_err(|_| AppError::Timeout)?
    }
}
