use async_trait::async_trait;

use crate::{
    entry::{Entry, EntryId, FieldUpdate},
    error::AppError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    NoMatch,
    Matched { modified: u64 },
}

/// Single-document operations over the entry collection.
///
/// Implementations must apply each call atomically to the one document it touches.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn insert(&self, entry: &Entry) -> Result<(), AppError>;

    async fn list(&self) -> Result<Vec<Entry>, AppError>;

    async fn get(&self, id: EntryId) -> Result<Option<Entry>, AppError>;

    /// Entries whose ingredient list holds an element equal to `ingredient`.
    async fn find_by_ingredient(&self, ingredient: &str) -> Result<Vec<Entry>, AppError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|entry| entry.contains_ingredient(ingredient))
            .collect())
    }

    async fn update(
        &self,
        id: EntryId,
        changes: &[FieldUpdate],
    ) -> Result<UpdateOutcome, AppError>;

    async fn delete(&self, id: EntryId) -> Result<u64, AppError>;
}
