use async_trait::async_trait;
use tracing::warn;

use crate::application::{AppError, AppResult, Notifier};
use crate::domain::{CommitEntry, ReleaseInfo, RepoInfo, Watch};

/// Fans one announcement out to several notifiers.
///
/// A failing notifier does not stop the others; the last error is returned.
pub struct MultiNotifier {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl MultiNotifier {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

fn keep_last(last_err: &mut Option<AppError>, result: AppResult<()>) {
    if let Err(e) = result {
        warn!(error = %e, "notifier failed");
        *last_err = Some(e);
    }
}

fn finish(last_err: Option<AppError>) -> AppResult<()> {
    match last_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[async_trait]
impl Notifier for MultiNotifier {
    async fn announce_new_repository(&self, watch: &Watch, repo: &RepoInfo) -> AppResult<()> {
        let mut last_err = None;
        for n in &self.notifiers {
            keep_last(&mut last_err, n.announce_new_repository(watch, repo).await);
        }
        finish(last_err)
    }

    async fn announce_release(&self, watch: &Watch, release: &ReleaseInfo) -> AppResult<()> {
        let mut last_err = None;
        for n in &self.notifiers {
            keep_last(&mut last_err, n.announce_release(watch, release).await);
        }
        finish(last_err)
    }

    async fn announce_commit_batch(
        &self,
        watch: &Watch,
        repo: &RepoInfo,
        commits: &[CommitEntry],
    ) -> AppResult<()> {
        let mut last_err = None;
        for n in &self.notifiers {
            keep_last(
                &mut last_err,
                n.announce_commit_batch(watch, repo, commits).await,
            );
        }
        finish(last_err)
    }
}
