use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    CommitDetail, CommitEntry, CommitRef, ReleaseInfo, RepoInfo, Seen, Watch, WatchType,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Transport error or non-2xx status from an upstream call.
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// Upstream answered, but not with the expected array/object.
    #[error("unexpected response shape: {0}")]
    Shape(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("notifier error: {0}")]
    Notifier(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("watch already exists: {0}")]
    Conflict(String),
    #[error("watch not found: {0}")]
    NotFound(String),
    #[error("invalid watch: {0}")]
    InvalidWatch(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Read-only view of the GitHub REST API used by the checkers.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Most recently created repositories of `username`, newest first.
    async fn list_user_repos(&self, username: &str, per_page: u32) -> AppResult<Vec<RepoInfo>>;
    /// Most recent releases of `repo`, newest first.
    async fn list_releases(&self, repo: &str, per_page: u32) -> AppResult<Vec<ReleaseInfo>>;
    async fn get_repository(&self, repo: &str) -> AppResult<RepoInfo>;
    /// Most recent commits on `branch`, newest first.
    async fn list_commits(
        &self,
        repo: &str,
        branch: &str,
        per_page: u32,
    ) -> AppResult<Vec<CommitRef>>;
    async fn get_commit(&self, repo: &str, sha: &str) -> AppResult<CommitDetail>;
}

/// Persisted ledger of already-announced identifiers.
#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn has_seen(&self, target: &str, item: Seen<'_>) -> AppResult<bool>;
    /// Append-only. Returns false if `item` was already recorded.
    async fn mark_seen(&self, target: &str, item: Seen<'_>) -> AppResult<bool>;
    /// Write the ledger to durable storage.
    async fn persist(&self) -> AppResult<()>;
}

/// CRUD over watch definitions.
#[async_trait]
pub trait WatchRegistry: Send + Sync {
    async fn add(&self, kind: WatchType, target: &str, channel: Option<String>)
        -> AppResult<Watch>;
    async fn remove(&self, id: &str) -> AppResult<Watch>;
    async fn list(&self) -> AppResult<Vec<Watch>>;
}

/// Deliver notifications.
///
/// Implementations resolve the destination from `watch.channel` or their own
/// default and silently skip when there is none. Errors are reported to the
/// caller, which logs them; nothing is retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn announce_new_repository(&self, watch: &Watch, repo: &RepoInfo) -> AppResult<()>;
    async fn announce_release(&self, watch: &Watch, release: &ReleaseInfo) -> AppResult<()>;
    async fn announce_commit_batch(
        &self,
        watch: &Watch,
        repo: &RepoInfo,
        commits: &[CommitEntry],
    ) -> AppResult<()>;
}

/// Raw key-value persistence for whole documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, key: &str) -> AppResult<Option<String>>;
    async fn write(&self, key: &str, body: &str) -> AppResult<()>;
}

/// Waits out a commit grouping window.
#[async_trait]
pub trait WindowTimer: Send + Sync {
    async fn wait(&self, window: Duration);
}
