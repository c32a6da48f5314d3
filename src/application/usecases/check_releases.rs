use tracing::{info, warn};

use crate::application::{AppResult, DedupStore, GitHubApi, Notifier};
use crate::domain::{Seen, Watch};

pub const RELEASES_PER_PAGE: u32 = 10;

pub struct CheckReleasesUseCase<'a> {
    pub github: &'a dyn GitHubApi,
    pub dedup: &'a dyn DedupStore,
    pub notifier: &'a dyn Notifier,
}

impl<'a> CheckReleasesUseCase<'a> {
    pub async fn execute(&self, watch: &Watch) -> AppResult<usize> {
        let repo = watch.target.as_str();
        let mut releases = self.github.list_releases(repo, RELEASES_PER_PAGE).await?;
        releases.reverse();

        let mut announced = 0;
        for release in &releases {
            let item = Seen::Release(release.id);
            if self.dedup.has_seen(repo, item).await? {
                continue;
            }

            info!(repo = %repo, release = %release.title(), "new release");
            if let Err(e) = self.notifier.announce_release(watch, release).await {
                warn!(
                    repo = %repo,
                    release_id = release.id,
                    error = %e,
                    "release announcement dropped"
                );
            }
            self.dedup.mark_seen(repo, item).await?;
            announced += 1;
        }
        Ok(announced)
    }
}
