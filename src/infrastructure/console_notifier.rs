use async_trait::async_trait;

use crate::application::{AppResult, Notifier};
use crate::domain::{CommitEntry, ReleaseInfo, RepoInfo, Watch};

/// Prints announcements to stdout. Used for `--dry-run` and alongside real
/// delivery.
pub struct ConsoleNotifier {
    default_channel: Option<String>,
}

impl ConsoleNotifier {
    pub fn new(default_channel: Option<String>) -> Self {
        Self { default_channel }
    }

    fn channel<'a>(&'a self, watch: &'a Watch) -> &'a str {
        watch
            .destination(self.default_channel.as_deref())
            .unwrap_or("(none)")
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn announce_new_repository(&self, watch: &Watch, repo: &RepoInfo) -> AppResult<()> {
        println!(
            "NOTIFY: new repository watch={} channel={} repo={} url={}",
            watch.id,
            self.channel(watch),
            repo.full_name,
            repo.html_url
        );
        Ok(())
    }

    async fn announce_release(&self, watch: &Watch, release: &ReleaseInfo) -> AppResult<()> {
        println!(
            "NOTIFY: new release watch={} channel={} release={} tag={} url={}",
            watch.id,
            self.channel(watch),
            release.title(),
            release.tag_name.as_deref().unwrap_or("(none)"),
            release.html_url
        );
        Ok(())
    }

    async fn announce_commit_batch(
        &self,
        watch: &Watch,
        repo: &RepoInfo,
        commits: &[CommitEntry],
    ) -> AppResult<()> {
        println!(
            "NOTIFY: {} new commit(s) watch={} channel={} repo={} branch={}",
            commits.len(),
            watch.id,
            self.channel(watch),
            repo.full_name,
            repo.default_branch
        );
        for c in commits {
            println!("  {} {} (by {})", c.short_sha(), c.short_message, c.author_name);
        }
        Ok(())
    }
}
