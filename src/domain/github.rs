use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository metadata as needed for announcements and commit batches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    pub name: String,
    pub owner_login: String,
    pub owner_avatar_url: Option<String>,
    pub owner_html_url: Option<String>,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub topics: Vec<String>,
    pub default_branch: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RepoInfo {
    pub fn commits_url(&self) -> String {
        format!("{}/commits/{}", self.html_url, self.default_branch)
    }

    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}.git", self.full_name)
    }

    pub fn zip_url(&self) -> String {
        format!(
            "{}/archive/refs/heads/{}.zip",
            self.html_url, self.default_branch
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub id: u64,
    pub tag_name: Option<String>,
    pub name: Option<String>,
    pub body: Option<String>,
    pub html_url: String,
    pub prerelease: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl ReleaseInfo {
    /// Release name, falling back to the tag, then the numeric id.
    pub fn title(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.tag_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("release {}", self.id))
    }
}

/// An entry of a repository's commit list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitRef {
    pub sha: String,
}

/// Full commit detail, reduced to what announcements use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitDetail {
    pub sha: String,
    pub message: Option<String>,
    pub author_name: Option<String>,
    pub author_login: Option<String>,
    pub html_url: Option<String>,
}

/// A detected commit waiting in a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub sha: String,
    pub short_message: String,
    pub author_name: String,
    pub repo_full_name: String,
    pub default_branch: String,
    pub html_url: Option<String>,
}

impl CommitEntry {
    pub fn new(detail: CommitDetail, repo: &RepoInfo) -> Self {
        let short_message = detail
            .message
            .as_deref()
            .and_then(|m| m.lines().next())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("(no message)")
            .to_string();
        let author_name = detail
            .author_name
            .filter(|n| !n.is_empty())
            .or(detail.author_login)
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            sha: detail.sha,
            short_message,
            author_name,
            repo_full_name: repo.full_name.clone(),
            default_branch: repo.default_branch.clone(),
            html_url: detail.html_url,
        }
    }

    pub fn short_sha(&self) -> &str {
        let end = self
            .sha
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.sha.len());
        &self.sha[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoInfo {
        RepoInfo {
            full_name: "acme/widget".into(),
            name: "widget".into(),
            owner_login: "acme".into(),
            owner_avatar_url: None,
            owner_html_url: None,
            html_url: "https://github.com/acme/widget".into(),
            description: None,
            language: None,
            stargazers_count: 0,
            topics: vec![],
            default_branch: "trunk".into(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn commit_entry_uses_first_line_and_author_fallbacks() {
        let detail = CommitDetail {
            sha: "0123456789abcdef".into(),
            message: Some("Fix the thing\n\nLonger body".into()),
            author_name: None,
            author_login: Some("octocat".into()),
            html_url: None,
        };
        let entry = CommitEntry::new(detail, &repo());
        assert_eq!(entry.short_message, "Fix the thing");
        assert_eq!(entry.author_name, "octocat");
        assert_eq!(entry.default_branch, "trunk");
        assert_eq!(entry.short_sha(), "0123456");
    }

    #[test]
    fn commit_entry_placeholders() {
        let detail = CommitDetail {
            sha: "abc".into(),
            message: None,
            author_name: None,
            author_login: None,
            html_url: None,
        };
        let entry = CommitEntry::new(detail, &repo());
        assert_eq!(entry.short_message, "(no message)");
        assert_eq!(entry.author_name, "Unknown");
        assert_eq!(entry.short_sha(), "abc");
    }

    #[test]
    fn release_title_falls_back_to_tag() {
        let release = ReleaseInfo {
            id: 1,
            tag_name: Some("v1.2.0".into()),
            name: Some("".into()),
            body: None,
            html_url: "https://github.com/acme/widget/releases/v1.2.0".into(),
            prerelease: false,
            published_at: None,
        };
        assert_eq!(release.title(), "v1.2.0");
    }
}
