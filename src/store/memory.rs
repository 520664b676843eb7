//! In-process experience store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ExperienceRecord, ExperienceStore, StoreError, EXPERIENCE_STEP};

/// Keeps records in a map guarded by a mutex. The lock is never held across
/// an await point, so every operation is atomic.
#[derive(Debug, Default)]
pub struct InMemoryExperienceStore {
    records: Mutex<HashMap<String, i32>>,
}

impl InMemoryExperienceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, i32>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ExperienceStore for InMemoryExperienceStore {
    async fn get(&self, user_id: &str) -> Result<ExperienceRecord, StoreError> {
        self.records()
            .get(user_id)
            .map(|&experience| ExperienceRecord {
                user_id: user_id.to_string(),
                experience,
            })
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, user_id: &str) -> Result<ExperienceRecord, StoreError> {
        let mut records = self.records();
        if records.contains_key(user_id) {
            return Err(StoreError::Conflict);
        }
        records.insert(user_id.to_string(), 0);
        Ok(ExperienceRecord::new(user_id))
    }

    async fn increment_by_ten(&self, user_id: &str) -> Result<ExperienceRecord, StoreError> {
        let mut records = self.records();
        let experience = records.get_mut(user_id).ok_or(StoreError::NotFound)?;
        *experience = experience.saturating_add(EXPERIENCE_STEP);
        Ok(ExperienceRecord {
            user_id: user_id.to_string(),
            experience: *experience,
        })
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.records().remove(user_id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_then_get_starts_at_zero() {
        let store = InMemoryExperienceStore::new();
        store.create("u1").await.unwrap();

        assert_eq!(store.get("u1").await.unwrap(), ExperienceRecord::new("u1"));
    }

    #[tokio::test]
    async fn test_second_create_conflicts() {
        let store = InMemoryExperienceStore::new();
        store.create("u1").await.unwrap();

        assert_eq!(store.create("u1").await, Err(StoreError::Conflict));
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let store = InMemoryExperienceStore::new();
        assert_eq!(store.get("ghost").await, Err(StoreError::NotFound));
        assert_eq!(store.increment_by_ten("ghost").await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_sequential_increments_add_ten_each() {
        let store = InMemoryExperienceStore::new();
        store.create("u1").await.unwrap();

        assert_eq!(store.increment_by_ten("u1").await.unwrap().experience, 10);
        for _ in 0..4 {
            store.increment_by_ten("u1").await.unwrap();
        }
        assert_eq!(store.get("u1").await.unwrap().experience, 50);
    }

    #[tokio::test]
    async fn test_concurrent_increments_do_not_lose_updates() {
        let store = Arc::new(InMemoryExperienceStore::new());
        store.create("u1").await.unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_by_ten("u1").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.get("u1").await.unwrap().experience, 200);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryExperienceStore::new();
        store.create("u1").await.unwrap();

        store.delete("u1").await.unwrap();
        store.delete("u1").await.unwrap();
        store.delete("never-existed").await.unwrap();
        assert!(store.is_empty());
    }
}
