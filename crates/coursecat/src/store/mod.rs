//! Document store seam used by the pipeline.
//!
//! The pipeline only needs bulk reads, atomic batched category writes and
//! a named lease for single-flight runs. `SqliteCourseStore` is the bundled
//! implementation; hosts with another backend implement `CourseStore`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::course::{CategoryUpdate, CourseRecord};
use crate::db::DatabaseError;

pub mod sqlite;

pub use sqlite::SqliteCourseStore;

/// Errors raised by a document store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Updates staged for one atomic commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    updates: Vec<CategoryUpdate>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, update: CategoryUpdate) {
        self.updates.push(update);
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn updates(&self) -> &[CategoryUpdate] {
        &self.updates
    }

    /// Hands the staged updates over, leaving an empty batch behind.
    pub fn take(&mut self) -> WriteBatch {
        std::mem::take(self)
    }
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Reads records in store order, after the record with id `after`.
    /// `limit = None` reads everything that remains.
    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CourseRecord>, StoreError>;

    /// Reads at most `limit` records from the start of the collection.
    async fn fetch_limited(&self, limit: usize) -> Result<Vec<CourseRecord>, StoreError> {
        self.fetch_page(None, Some(limit)).await
    }

    /// Applies every staged update atomically. Timestamps are assigned by
    /// the store at commit time.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Takes the named lease unless another owner holds an unexpired one.
    async fn try_acquire_lock(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Extends `owner`'s lease by `ttl` from now. Returns `false` when
    /// `owner` no longer holds the lease.
    async fn renew_lock(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    async fn release_lock(&self, name: &str, owner: &str) -> Result<(), StoreError>;
}

/// Reads the whole collection, `page_size` records per call.
///
/// `page_size = 0` reads everything in a single call.
pub async fn fetch_all(
    store: &dyn CourseStore,
    page_size: usize,
) -> Result<Vec<CourseRecord>, StoreError> {
    if page_size == 0 {
        return store.fetch_page(None, None).await;
    }

    let mut records: Vec<CourseRecord> = Vec::new();
    loop {
        let after = records.last().map(|r| r.id.clone());
        let page = store.fetch_page(after.as_deref(), Some(page_size)).await?;
        let exhausted = page.len() < page_size;
        records.extend(page);
        if exhausted {
            break;
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(id: &str) -> CategoryUpdate {
        CategoryUpdate::Generated {
            record_id: id.to_string(),
            category: "Surgery".to_string(),
            confidence: "high".to_string(),
            version: "1.0".to_string(),
        }
    }

    #[test]
    fn test_write_batch_take_resets() {
        let mut batch = WriteBatch::new();
        batch.stage(generated("a"));
        batch.stage(generated("b"));
        assert_eq!(batch.len(), 2);

        let taken = batch.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.updates()[1].record_id(), "b");
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_pages_through_collection() {
        let store = SqliteCourseStore::open_in_memory().unwrap();
        for i in 0..7 {
            store
                .upsert(&CourseRecord::new(format!("c{:02}", i)))
                .unwrap();
        }

        for page_size in [0, 1, 3, 7, 50] {
            let all = fetch_all(&store, page_size).await.unwrap();
            let ids: Vec<_> = all.iter().map(|r| r.id.clone()).collect();
            let expected: Vec<_> = (0..7).map(|i| format!("c{:02}", i)).collect();
            assert_eq!(ids, expected, "page_size={}", page_size);
        }
    }
}
