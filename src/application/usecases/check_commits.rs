use tracing::{debug, warn};

use crate::application::{AppResult, CommitGrouper, DedupStore, GitHubApi};
use crate::domain::{CommitEntry, Seen, Watch};

pub const COMMITS_PER_PAGE: u32 = 10;

/// Queues new commits on a repository's default branch for grouped
/// announcement.
///
/// A SHA is recorded as seen as soon as it is queued, and also when its
/// detail cannot be fetched. Delivery is therefore at most once: a batch that
/// fails to send is not retried.
pub struct CheckCommitsUseCase<'a> {
    pub github: &'a dyn GitHubApi,
    pub dedup: &'a dyn DedupStore,
    pub grouper: &'a CommitGrouper,
}

impl<'a> CheckCommitsUseCase<'a> {
    /// Returns how many commits were queued.
    pub async fn execute(&self, watch: &Watch) -> AppResult<usize> {
        let target = watch.target.as_str();
        let repo = self.github.get_repository(target).await?;
        let mut commits = self
            .github
            .list_commits(target, &repo.default_branch, COMMITS_PER_PAGE)
            .await?;
        commits.reverse();

        let mut queued = 0;
        for commit in &commits {
            let item = Seen::Commit(&commit.sha);
            if self.dedup.has_seen(target, item).await? {
                continue;
            }

            match self.github.get_commit(target, &commit.sha).await {
                Ok(detail) => {
                    debug!(repo = %target, sha = %commit.sha, "queueing commit");
                    self.grouper
                        .enqueue(watch, &repo, CommitEntry::new(detail, &repo))?;
                    queued += 1;
                }
                Err(e) => {
                    warn!(
                        repo = %target,
                        sha = %commit.sha,
                        error = %e,
                        "commit detail unavailable, marking seen"
                    );
                }
            }
            self.dedup.mark_seen(target, item).await?;
        }
        Ok(queued)
    }
}
