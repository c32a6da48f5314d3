use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::application::{AppError, AppResult, GitHubApi};
use crate::domain::{CommitDetail, CommitRef, ReleaseInfo, RepoInfo};

/// Scripted GitHub for tests and offline runs.
///
/// Lists are stored newest first, as the API returns them. Unknown users,
/// repositories and commits answer with a `Fetch` error, like a 404 would; a
/// repository without scripted releases simply has none.
#[derive(Clone, Default)]
pub struct FakeGitHub {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    user_repos: HashMap<String, Vec<RepoInfo>>,
    releases: HashMap<String, Vec<ReleaseInfo>>,
    repos: HashMap<String, RepoInfo>,
    commits: HashMap<String, Vec<CommitDetail>>,
    broken_details: HashSet<String>,
    failing: HashSet<String>,
    malformed: HashSet<String>,
    delay: Option<Duration>,
    calls: Vec<String>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut inner)
    }

    /// Replaces `username`'s repositories (newest first).
    pub fn set_user_repos(&self, username: &str, repos: Vec<RepoInfo>) {
        self.with(|i| i.user_repos.insert(username.to_string(), repos));
    }

    /// Replaces the repository's releases (newest first).
    pub fn set_releases(&self, repo: &str, releases: Vec<ReleaseInfo>) {
        self.with(|i| i.releases.insert(repo.to_string(), releases));
    }

    /// Registers repository metadata and its commits (newest first).
    pub fn set_commits(&self, repo: RepoInfo, commits: Vec<CommitDetail>) {
        self.with(|i| {
            i.commits.insert(repo.full_name.clone(), commits);
            i.repos.insert(repo.full_name.clone(), repo);
        });
    }

    /// Makes the detail lookup for `sha` fail.
    pub fn break_commit_detail(&self, sha: &str) {
        self.with(|i| i.broken_details.insert(sha.to_string()));
    }

    /// Every call concerning `target` (user or repo) fails with `Fetch`.
    pub fn fail_target(&self, target: &str) {
        self.with(|i| i.failing.insert(target.to_string()));
    }

    /// Every call concerning `target` fails with `Shape`.
    pub fn malform_target(&self, target: &str) {
        self.with(|i| i.malformed.insert(target.to_string()));
    }

    pub fn heal_target(&self, target: &str) {
        self.with(|i| {
            i.failing.remove(target);
            i.malformed.remove(target);
        });
    }

    /// Sleeps this long inside every call.
    pub fn set_delay(&self, delay: Duration) {
        self.with(|i| i.delay = Some(delay));
    }

    /// Calls made so far, as `"<operation> <target>"`.
    pub fn calls(&self) -> Vec<String> {
        self.with(|i| i.calls.clone())
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.with(|i| {
            i.calls
                .iter()
                .filter(|c| c.split(' ').next() == Some(operation))
                .count()
        })
    }

    async fn enter(&self, operation: &str, target: &str) -> AppResult<()> {
        let delay = self.with(|i| {
            i.calls.push(format!("{operation} {target}"));
            i.delay
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.with(|i| {
            if i.failing.contains(target) {
                Err(AppError::Fetch(format!("{operation} {target}: 502 Bad Gateway")))
            } else if i.malformed.contains(target) {
                Err(AppError::Shape(format!("{operation} {target}: expected array")))
            } else {
                Ok(())
            }
        })
    }
}

fn not_found(what: &str) -> AppError {
    AppError::Fetch(format!("{what}: 404 Not Found"))
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn list_user_repos(&self, username: &str, per_page: u32) -> AppResult<Vec<RepoInfo>> {
        self.enter("list_user_repos", username).await?;
        self.with(|i| {
            i.user_repos
                .get(username)
                .map(|r| r.iter().take(per_page as usize).cloned().collect())
                .ok_or_else(|| not_found(username))
        })
    }

    async fn list_releases(&self, repo: &str, per_page: u32) -> AppResult<Vec<ReleaseInfo>> {
        self.enter("list_releases", repo).await?;
        self.with(|i| {
            Ok(i.releases
                .get(repo)
                .map(|r| r.iter().take(per_page as usize).cloned().collect())
                .unwrap_or_default())
        })
    }

    async fn get_repository(&self, repo: &str) -> AppResult<RepoInfo> {
        self.enter("get_repository", repo).await?;
        self.with(|i| i.repos.get(repo).cloned().ok_or_else(|| not_found(repo)))
    }

    async fn list_commits(
        &self,
        repo: &str,
        _branch: &str,
        per_page: u32,
    ) -> AppResult<Vec<CommitRef>> {
        self.enter("list_commits", repo).await?;
        self.with(|i| {
            i.commits
                .get(repo)
                .map(|c| {
                    c.iter()
                        .take(per_page as usize)
                        .map(|d| CommitRef { sha: d.sha.clone() })
                        .collect()
                })
                .ok_or_else(|| not_found(repo))
        })
    }

    async fn get_commit(&self, repo: &str, sha: &str) -> AppResult<CommitDetail> {
        self.enter("get_commit", repo).await?;
        self.with(|i| {
            if i.broken_details.contains(sha) {
                return Err(AppError::Fetch(format!("{repo}@{sha}: 500")));
            }
            i.commits
                .get(repo)
                .and_then(|c| c.iter().find(|d| d.sha == sha).cloned())
                .ok_or_else(|| not_found(sha))
        })
    }
}

/// Repository fixture with deterministic URLs.
pub fn repo_fixture(full_name: &str) -> RepoInfo {
    let (owner, name) = full_name.split_once('/').unwrap_or(("octocat", full_name));
    RepoInfo {
        full_name: full_name.to_string(),
        name: name.to_string(),
        owner_login: owner.to_string(),
        owner_avatar_url: None,
        owner_html_url: Some(format!("https://github.com/{owner}")),
        html_url: format!("https://github.com/{full_name}"),
        description: None,
        language: None,
        stargazers_count: 0,
        topics: vec![],
        default_branch: "main".to_string(),
        created_at: Utc.timestamp_opt(1_700_000_000, 0).single(),
        updated_at: None,
    }
}

pub fn release_fixture(id: u64, tag: &str) -> ReleaseInfo {
    ReleaseInfo {
        id,
        tag_name: Some(tag.to_string()),
        name: None,
        body: None,
        html_url: format!("https://github.com/releases/{tag}"),
        prerelease: false,
        published_at: None,
    }
}

pub fn commit_fixture(sha: &str, message: &str) -> CommitDetail {
    CommitDetail {
        sha: sha.to_string(),
        message: Some(message.to_string()),
        author_name: Some("Ada".to_string()),
        author_login: None,
        html_url: None,
    }
}
