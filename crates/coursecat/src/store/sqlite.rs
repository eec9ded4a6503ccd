use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::{CourseStore, StoreError, WriteBatch};
use crate::course::CourseRecord;
use crate::db::{course_repo, lock_repo, Database, DatabaseError};

/// `CourseStore` backed by the local SQLite database.
#[derive(Clone)]
pub struct SqliteCourseStore {
    db: Database,
}

impl SqliteCourseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Imports or replaces one record.
    pub fn upsert(&self, record: &CourseRecord) -> Result<(), DatabaseError> {
        course_repo::upsert(&self.db, record)
    }

    pub fn find(&self, id: &str) -> Result<Option<CourseRecord>, DatabaseError> {
        course_repo::find_by_id(&self.db, id)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<u64, DatabaseError> {
        course_repo::count(&self.db)
    }
}

#[async_trait]
impl CourseStore for SqliteCourseStore {
    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CourseRecord>, StoreError> {
        let records = course_repo::list_page(&self.db, after, limit.map(|l| l as u64))?;
        Ok(records)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let touched = course_repo::apply_updates(&self.db, batch.updates(), Utc::now())?;
        if touched < batch.len() {
            debug!(
                staged = batch.len(),
                touched, "Some staged updates referenced missing records"
            );
        }
        Ok(())
    }

    async fn try_acquire_lock(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let acquired = lock_repo::try_acquire(&self.db, name, owner, Utc::now(), lease(ttl)?)?;
        if !acquired {
            if let Some(held) = lock_repo::find(&self.db, name)? {
                debug!(
                    lock = name,
                    holder = %held.owner,
                    expires_at = %held.expires_at,
                    "Lock is held by another owner"
                );
            }
        }
        Ok(acquired)
    }

    async fn renew_lock(
        &self,
        name: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        Ok(lock_repo::renew(&self.db, name, owner, Utc::now(), lease(ttl)?)?)
    }

    async fn release_lock(&self, name: &str, owner: &str) -> Result<(), StoreError> {
        if !lock_repo::release(&self.db, name, owner)? {
            debug!(lock = name, owner, "Lock was no longer held at release");
        }
        Ok(())
    }
}

fn lease(ttl: Duration) -> Result<chrono::Duration, StoreError> {
    chrono::Duration::from_std(ttl)
        .map_err(|e| StoreError::Backend(format!("Lock TTL out of range: {}", e)))
}
