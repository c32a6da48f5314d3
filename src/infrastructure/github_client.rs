use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::application::{AppError, AppResult, GitHubApi};
use crate::domain::{CommitDetail, CommitRef, ReleaseInfo, RepoInfo};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base(DEFAULT_API_BASE, token)
    }

    pub fn with_base(api_base: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// GET `path` and decode it as `T`.
    ///
    /// Transport errors and non-2xx statuses are `Fetch`; a body that does
    /// not decode as `T` is `Shape`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_base, path);
        debug!(%url, ?query, "github request");

        let mut req = self
            .client
            .get(&url)
            .query(query)
            .header(USER_AGENT, "repowatch")
            .header(ACCEPT, "application/vnd.github+json");

        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("{url}: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Fetch(format!("{url}: {e}")))?;

        decode(&url, &body)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(url: &str, body: &str) -> AppResult<T> {
    serde_json::from_str(body).map_err(|e| AppError::Shape(format!("{url}: {e}")))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoResp {
    full_name: String,
    name: String,
    owner: OwnerResp,
    html_url: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: Option<u64>,
    #[serde(default)]
    topics: Option<Vec<String>>,
    default_branch: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct OwnerResp {
    login: String,
    avatar_url: Option<String>,
    html_url: Option<String>,
}

impl From<RepoResp> for RepoInfo {
    fn from(r: RepoResp) -> Self {
        Self {
            full_name: r.full_name,
            name: r.name,
            owner_login: r.owner.login,
            owner_avatar_url: r.owner.avatar_url,
            owner_html_url: r.owner.html_url,
            html_url: r.html_url,
            description: r.description,
            language: r.language,
            stargazers_count: r.stargazers_count.unwrap_or(0),
            topics: r.topics.unwrap_or_default(),
            default_branch: r
                .default_branch
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| "main".to_string()),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseResp {
    id: u64,
    tag_name: Option<String>,
    name: Option<String>,
    body: Option<String>,
    html_url: String,
    #[serde(default)]
    prerelease: bool,
    published_at: Option<DateTime<Utc>>,
}

impl From<ReleaseResp> for ReleaseInfo {
    fn from(r: ReleaseResp) -> Self {
        Self {
            id: r.id,
            tag_name: r.tag_name,
            name: r.name,
            body: r.body,
            html_url: r.html_url,
            prerelease: r.prerelease,
            published_at: r.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitListItem {
    sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitResp {
    sha: String,
    commit: CommitObj,
    author: Option<UserObj>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitObj {
    message: Option<String>,
    author: Option<GitAuthor>,
}

#[derive(Debug, Deserialize)]
struct GitAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserObj {
    login: Option<String>,
}

impl From<CommitResp> for CommitDetail {
    fn from(c: CommitResp) -> Self {
        Self {
            sha: c.sha,
            message: c.commit.message,
            author_name: c.commit.author.and_then(|a| a.name),
            author_login: c.author.and_then(|a| a.login),
            html_url: c.html_url,
        }
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn list_user_repos(&self, username: &str, per_page: u32) -> AppResult<Vec<RepoInfo>> {
        let per_page = per_page.to_string();
        let repos: Vec<RepoResp> = self
            .get_json(
                &format!("/users/{username}/repos"),
                &[("per_page", per_page.as_str()), ("sort", "created")],
            )
            .await?;
        Ok(repos.into_iter().map(RepoInfo::from).collect())
    }

    async fn list_releases(&self, repo: &str, per_page: u32) -> AppResult<Vec<ReleaseInfo>> {
        let per_page = per_page.to_string();
        let releases: Vec<ReleaseResp> = self
            .get_json(
                &format!("/repos/{repo}/releases"),
                &[("per_page", per_page.as_str())],
            )
            .await?;
        Ok(releases.into_iter().map(ReleaseInfo::from).collect())
    }

    async fn get_repository(&self, repo: &str) -> AppResult<RepoInfo> {
        let body: RepoResp = self.get_json(&format!("/repos/{repo}"), &[]).await?;
        Ok(body.into())
    }

    async fn list_commits(
        &self,
        repo: &str,
        branch: &str,
        per_page: u32,
    ) -> AppResult<Vec<CommitRef>> {
        let per_page = per_page.to_string();
        let commits: Vec<CommitListItem> = self
            .get_json(
                &format!("/repos/{repo}/commits"),
                &[("sha", branch), ("per_page", per_page.as_str())],
            )
            .await?;
        Ok(commits
            .into_iter()
            .map(|c| CommitRef { sha: c.sha })
            .collect())
    }

    async fn get_commit(&self, repo: &str, sha: &str) -> AppResult<CommitDetail> {
        let body: CommitResp = self
            .get_json(&format!("/repos/{repo}/commits/{sha}"), &[])
            .await?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_repository_list() {
        let body = r#"[{
            "full_name": "octocat/hello",
            "name": "hello",
            "owner": {"login": "octocat", "avatar_url": "https://a/1", "html_url": "https://github.com/octocat"},
            "html_url": "https://github.com/octocat/hello",
            "description": null,
            "language": "Rust",
            "stargazers_count": 3,
            "topics": ["cli"],
            "default_branch": "trunk",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-02T10:00:00Z"
        }]"#;
        let repos: Vec<RepoResp> = decode("test", body).unwrap();
        let repo = RepoInfo::from(repos.into_iter().next().unwrap());
        assert_eq!(repo.full_name, "octocat/hello");
        assert_eq!(repo.default_branch, "trunk");
        assert_eq!(repo.topics, vec!["cli"]);
        assert!(repo.created_at.is_some());
    }

    #[test]
    fn default_branch_falls_back_to_main() {
        let body = r#"{"full_name": "a/b", "name": "b", "owner": {"login": "a"}, "html_url": "https://github.com/a/b"}"#;
        let repo: RepoInfo = decode::<RepoResp>("test", body).unwrap().into();
        assert_eq!(repo.default_branch, "main");
        assert_eq!(repo.stargazers_count, 0);
    }

    #[test]
    fn object_where_array_expected_is_shape_error() {
        let body = r#"{"message": "Not Found"}"#;
        let err = decode::<Vec<ReleaseResp>>("test", body).unwrap_err();
        assert!(matches!(err, AppError::Shape(_)));
    }

    #[test]
    fn decodes_commit_detail() {
        let body = r#"{
            "sha": "abc123",
            "html_url": "https://github.com/a/b/commit/abc123",
            "commit": {"message": "Add x\n\nbody", "author": {"name": "Ada"}},
            "author": {"login": "ada"}
        }"#;
        let detail: CommitDetail = decode::<CommitResp>("test", body).unwrap().into();
        assert_eq!(detail.author_name.as_deref(), Some("Ada"));
        assert_eq!(detail.author_login.as_deref(), Some("ada"));
        assert_eq!(detail.message.as_deref(), Some("Add x\n\nbody"));
    }
}
