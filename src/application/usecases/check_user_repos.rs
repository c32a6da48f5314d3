use tracing::{info, warn};

use crate::application::{AppResult, DedupStore, GitHubApi, Notifier};
use crate::domain::{Seen, Watch};

pub const USER_REPOS_PER_PAGE: u32 = 50;

/// Announces repositories a watched user has created since the last poll.
pub struct CheckUserReposUseCase<'a> {
    pub github: &'a dyn GitHubApi,
    pub dedup: &'a dyn DedupStore,
    pub notifier: &'a dyn Notifier,
}

impl<'a> CheckUserReposUseCase<'a> {
    /// Returns how many repositories were announced.
    pub async fn execute(&self, watch: &Watch) -> AppResult<usize> {
        let username = watch.target.as_str();
        let mut repos = self
            .github
            .list_user_repos(username, USER_REPOS_PER_PAGE)
            .await?;

        // API order is newest first; announce in creation order.
        repos.reverse();

        let mut announced = 0;
        for repo in &repos {
            let item = Seen::Repository(&repo.full_name);
            if self.dedup.has_seen(username, item).await? {
                continue;
            }

            info!(user = %username, repo = %repo.full_name, "new repository");
            if let Err(e) = self.notifier.announce_new_repository(watch, repo).await {
                warn!(repo = %repo.full_name, error = %e, "repository announcement dropped");
            }
            self.dedup.mark_seen(username, item).await?;
            announced += 1;
        }
        Ok(announced)
    }
}
