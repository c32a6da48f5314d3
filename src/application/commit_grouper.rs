//! Per-repository commit batching.
//!
//! A repository is either idle (no entry in the pending map) or collecting
//! (one `PendingBatch` with an armed window). The first commit for an idle
//! repository arms a timer for the grouping window; later commits only
//! append. The window never slides. When the timer fires the batch is removed
//! from the map under the lock and only then handed to the notifier, so a
//! commit that arrives mid-dispatch opens a new window instead of joining a
//! batch that is already on its way out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use crate::application::{AppError, AppResult, Notifier, WindowTimer};
use crate::domain::{CommitEntry, RepoInfo, Watch};

pub const DEFAULT_GROUP_WINDOW: Duration = Duration::from_millis(10_000);

#[derive(Clone)]
pub struct CommitGrouper {
    inner: Arc<Inner>,
}

struct Inner {
    window: Duration,
    timer: Arc<dyn WindowTimer>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<GroupState>,
}

#[derive(Default)]
struct GroupState {
    next_window: u64,
    pending: HashMap<String, PendingBatch>,
}

/// Commits collected for one repository during one window.
#[derive(Clone, Debug)]
pub struct PendingBatch {
    /// Sequence number of the window this batch belongs to.
    pub window_id: u64,
    pub watch: Watch,
    pub repo: RepoInfo,
    pub entries: Vec<CommitEntry>,
}

impl CommitGrouper {
    pub fn new(
        window: Duration,
        timer: Arc<dyn WindowTimer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                window,
                timer,
                notifier,
                state: Mutex::new(GroupState::default()),
            }),
        }
    }

    /// Adds `entry` to the repository's batch, arming a window if the
    /// repository was idle. Must be called from within a tokio runtime.
    pub fn enqueue(&self, watch: &Watch, repo: &RepoInfo, entry: CommitEntry) -> AppResult<()> {
        let key = batch_key(watch);
        let armed = {
            let mut state = self.inner.lock()?;
            if let Some(batch) = state.pending.get_mut(&key) {
                batch.entries.push(entry);
                None
            } else {
                state.next_window += 1;
                let window_id = state.next_window;
                state.pending.insert(
                    key.clone(),
                    PendingBatch {
                        window_id,
                        watch: watch.clone(),
                        repo: repo.clone(),
                        entries: vec![entry],
                    },
                );
                Some(window_id)
            }
        };

        if let Some(window_id) = armed {
            debug!(repo = %key, window_id, "commit window opened");
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                inner.timer.wait(inner.window).await;
                match inner.take(&key, window_id) {
                    Ok(Some(batch)) => inner.dispatch(batch).await,
                    Ok(None) => debug!(repo = %key, window_id, "window already drained"),
                    Err(e) => warn!(repo = %key, error = %e, "commit window flush failed"),
                }
            });
        }
        Ok(())
    }

    /// Number of commits waiting for `repo_key` (the watch target).
    pub fn pending_len(&self, repo_key: &str) -> usize {
        self.inner
            .lock()
            .map(|s| s.pending.get(repo_key).map_or(0, |b| b.entries.len()))
            .unwrap_or(0)
    }

    /// Repositories currently collecting.
    pub fn pending_repos(&self) -> usize {
        self.inner.lock().map(|s| s.pending.len()).unwrap_or(0)
    }

    /// Sends every pending batch now. Timers of drained windows become no-ops.
    pub async fn flush_all(&self) -> AppResult<usize> {
        let batches: Vec<PendingBatch> = {
            let mut state = self.inner.lock()?;
            let mut batches: Vec<PendingBatch> =
                state.pending.drain().map(|(_, b)| b).collect();
            batches.sort_by_key(|b| b.window_id);
            batches
        };
        let count = batches.len();
        for batch in batches {
            self.inner.dispatch(batch).await;
        }
        Ok(count)
    }
}

impl Inner {
    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, GroupState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Storage("lock poisoned".into()))
    }

    /// Removes the batch for `key` if it still belongs to `window_id`.
    fn take(&self, key: &str, window_id: u64) -> AppResult<Option<PendingBatch>> {
        let mut state = self.lock()?;
        let current = state
            .pending
            .get(key)
            .is_some_and(|batch| batch.window_id == window_id);
        Ok(if current { state.pending.remove(key) } else { None })
    }

    async fn dispatch(&self, batch: PendingBatch) {
        if batch.entries.is_empty() {
            return;
        }
        debug!(
            repo = %batch.repo.full_name,
            commits = batch.entries.len(),
            "flushing commit batch"
        );
        if let Err(e) = self
            .notifier
            .announce_commit_batch(&batch.watch, &batch.repo, &batch.entries)
            .await
        {
            warn!(
                repo = %batch.repo.full_name,
                commits = batch.entries.len(),
                error = %e,
                "commit batch notification dropped"
            );
        }
    }
}

fn batch_key(watch: &Watch) -> String {
    watch.target.clone()
}
