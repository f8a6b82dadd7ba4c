//! Example storage behind a trait, so handlers get it injected through `AppState`.

use crate::error::AppError;
use crate::model::{Example, ExamplePatch, NewExample};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

#[async_trait]
pub trait ExampleStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Example>, AppError>;
    async fn get(&self, id: &str) -> Result<Option<Example>, AppError>;
    async fn create(&self, input: NewExample) -> Result<Example, AppError>;
    /// `None` when no record has this id.
    async fn update(&self, id: &str, patch: ExamplePatch) -> Result<Option<Example>, AppError>;
    /// Returns the removed record.
    async fn delete(&self, id: &str) -> Result<Option<Example>, AppError>;
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, Example>,
    last_id: i64,
}

impl Inner {
    /// Millisecond timestamp, bumped past the previous id when the clock has not moved.
    fn next_id(&mut self, now_ms: i64) -> String {
        let id = now_ms.max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }
}

/// Process-lifetime store. One lock serializes every mutation.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::internal("example store lock poisoned")
}

#[async_trait]
impl ExampleStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Example>, AppError> {
        let guard = self.inner.read().map_err(poisoned)?;
        Ok(guard.records.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Example>, AppError> {
        let guard = self.inner.read().map_err(poisoned)?;
        Ok(guard.records.get(id).cloned())
    }

    async fn create(&self, input: NewExample) -> Result<Example, AppError> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        let now = Utc::now();
        let id = guard.next_id(now.timestamp_millis());
        let example = Example::new(id.clone(), input, now);
        guard.records.insert(id, example.clone());
        Ok(example)
    }

    async fn update(&self, id: &str, patch: ExamplePatch) -> Result<Option<Example>, AppError> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        let Some(example) = guard.records.get_mut(id) else {
            return Ok(None);
        };
        example.apply(patch, Utc::now());
        Ok(Some(example.clone()))
    }

    async fn delete(&self, id: &str) -> Result<Option<Example>, AppError> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        Ok(guard.records.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> NewExample {
        NewExample {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            description: None,
        }
    }

    #[test]
    fn ids_increase_even_when_clock_stalls() {
        let mut inner = Inner::default();
        assert_eq!(inner.next_id(1000), "1000");
        assert_eq!(inner.next_id(1000), "1001");
        assert_eq!(inner.next_id(999), "1002");
        assert_eq!(inner.next_id(5000), "5000");
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = InMemoryStore::new();
        let created = store.create(input("Ada")).await.unwrap();
        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn rapid_creates_get_distinct_ids() {
        let store = InMemoryStore::new();
        let mut ids = Vec::new();
        for i in 0..50 {
            ids.push(store.create(input(&format!("N{}", i))).await.unwrap().id);
        }
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(store.list().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let store = InMemoryStore::new();
        assert!(store.update("999", ExamplePatch::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_stamps_updated_at() {
        let store = InMemoryStore::new();
        let created = store.create(input("Ada")).await.unwrap();
        let patch = ExamplePatch {
            description: Some("mathematician".into()),
            ..Default::default()
        };
        let updated = store.update(&created.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.description.as_deref(), Some("mathematician"));
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn delete_returns_removed_record_once() {
        let store = InMemoryStore::new();
        let created = store.create(input("Ada")).await.unwrap();
        assert_eq!(store.delete(&created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(store.delete(&created.id).await.unwrap(), None);
        assert_eq!(store.get(&created.id).await.unwrap(), None);
    }
}
