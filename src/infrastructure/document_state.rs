use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::application::{AppError, AppResult, DedupStore, DocumentStore, WatchRegistry};
use crate::domain::{is_name_segment, RepoId, Seen, StateDocument, Watch, WatchType};

pub const STATE_KEY: &str = "db";

/// The watch list and the seen ledger, held in memory and written as one
/// document to a `DocumentStore`.
///
/// The in-memory copy is authoritative. The document lock is never held
/// across an await; writers are serialized by `persist_lock` and snapshot the
/// document only after acquiring it, so the last write always carries the
/// newest state.
pub struct DocumentState {
    store: Arc<dyn DocumentStore>,
    key: String,
    doc: Mutex<StateDocument>,
    persist_lock: tokio::sync::Mutex<()>,
}

impl DocumentState {
    /// Loads the document, creating and writing an empty one if absent.
    pub async fn open(store: Arc<dyn DocumentStore>) -> AppResult<Self> {
        Self::open_key(store, STATE_KEY).await
    }

    pub async fn open_key(store: Arc<dyn DocumentStore>, key: &str) -> AppResult<Self> {
        let (doc, fresh) = match store.read(key).await? {
            Some(body) if !body.trim().is_empty() => {
                let doc: StateDocument = serde_json::from_str(&body)
                    .map_err(|e| AppError::Storage(format!("corrupt state document: {e}")))?;
                (doc, false)
            }
            _ => (StateDocument::default(), true),
        };

        info!(
            watches = doc.watches.len(),
            seen = doc.seen.len(),
            "state loaded"
        );

        let state = Self {
            store,
            key: key.to_string(),
            doc: Mutex::new(doc),
            persist_lock: tokio::sync::Mutex::new(()),
        };
        if fresh {
            state.write_document().await?;
        }
        Ok(state)
    }

    /// A copy of the current document.
    pub fn snapshot(&self) -> AppResult<StateDocument> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, StateDocument>> {
        self.doc
            .lock()
            .map_err(|_| AppError::Storage("lock poisoned".into()))
    }

    async fn write_document(&self) -> AppResult<()> {
        let _guard = self.persist_lock.lock().await;
        let body = encode(&*self.lock()?)?;
        self.store.write(&self.key, &body).await
    }

    /// Applies `change` to a copy of the watch list and writes the resulting
    /// document. The in-memory list only takes the change once the write has
    /// succeeded.
    async fn commit_watches<R>(
        &self,
        change: impl FnOnce(&mut Vec<Watch>) -> AppResult<R>,
    ) -> AppResult<R> {
        let _guard = self.persist_lock.lock().await;
        let (body, watches, out) = {
            let mut next = self.lock()?.clone();
            let out = change(&mut next.watches)?;
            (encode(&next)?, next.watches, out)
        };
        self.store.write(&self.key, &body).await?;
        self.lock()?.watches = watches;
        Ok(out)
    }
}

fn encode(doc: &StateDocument) -> AppResult<String> {
    serde_json::to_string_pretty(doc).map_err(|e| AppError::Storage(e.to_string()))
}

fn validate_target(kind: WatchType, target: &str) -> AppResult<()> {
    let target = target.trim();
    match kind {
        WatchType::Repo => RepoId::parse(target)
            .map(|_| ())
            .map_err(|e| AppError::InvalidWatch(e.to_string())),
        WatchType::User if is_name_segment(target) => Ok(()),
        WatchType::User => Err(AppError::InvalidWatch(format!(
            "invalid username: {target:?}"
        ))),
    }
}

#[async_trait]
impl WatchRegistry for DocumentState {
    async fn add(
        &self,
        kind: WatchType,
        target: &str,
        channel: Option<String>,
    ) -> AppResult<Watch> {
        validate_target(kind, target)?;
        let watch = Watch::new(kind, target, channel);
        self.commit_watches(|watches| {
            if watches.iter().any(|w| w.id == watch.id) {
                return Err(AppError::Conflict(watch.id.clone()));
            }
            watches.push(watch.clone());
            Ok(())
        })
        .await?;
        info!(id = %watch.id, "watch added");
        Ok(watch)
    }

    async fn remove(&self, id: &str) -> AppResult<Watch> {
        let removed = self
            .commit_watches(|watches| {
                let index = watches
                    .iter()
                    .position(|w| w.id == id)
                    .ok_or_else(|| AppError::NotFound(id.to_string()))?;
                Ok(watches.remove(index))
            })
            .await?;
        info!(id = %removed.id, "watch removed");
        Ok(removed)
    }

    async fn list(&self) -> AppResult<Vec<Watch>> {
        Ok(self.lock()?.watches.clone())
    }
}

#[async_trait]
impl DedupStore for DocumentState {
    async fn has_seen(&self, target: &str, item: Seen<'_>) -> AppResult<bool> {
        Ok(self.lock()?.seen.contains(target, item))
    }

    async fn mark_seen(&self, target: &str, item: Seen<'_>) -> AppResult<bool> {
        let inserted = self.lock()?.seen.insert(target, item);
        if inserted {
            debug!(watch_target = %target, ?item, "marked seen");
        }
        Ok(inserted)
    }

    async fn persist(&self) -> AppResult<()> {
        self.write_document().await
    }
}
