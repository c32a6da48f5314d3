use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::{AppError, AppResult, DocumentStore};

/// Volatile document store, shared between clones.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    docs: HashMap<String, String>,
    writes: usize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(key: &str, body: &str) -> Self {
        let store = Self::default();
        if let Ok(mut inner) = store.inner.lock() {
            inner.docs.insert(key.to_string(), body.to_string());
        }
        store
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|i| i.writes).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| AppError::Storage("lock poisoned".into()))?;
        Ok(inner.docs.get(key).cloned())
    }

    async fn write(&self, key: &str, body: &str) -> AppResult<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AppError::Storage("lock poisoned".into()))?;
        inner.docs.insert(key.to_string(), body.to_string());
        inner.writes += 1;
        Ok(())
    }
}
