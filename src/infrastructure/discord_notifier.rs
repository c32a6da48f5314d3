use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::Serialize;
use tracing::debug;

use crate::application::{AppError, AppResult, Notifier};
use crate::domain::{CommitEntry, ReleaseInfo, RepoInfo, Watch};

pub const DEFAULT_DISCORD_API: &str = "https://discord.com/api/v10";

const EMBED_COLOR: u32 = 0x2f3136;
const FOOTER: &str = "repowatch · GitHub watcher";
const DESCRIPTION_LIMIT: usize = 300;
const COMMIT_MESSAGE_LIMIT: usize = 80;

/// Posts embeds to Discord channels through the bot REST API.
pub struct DiscordNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    default_channel: Option<String>,
    commit_role_id: Option<String>,
}

impl DiscordNotifier {
    pub fn new(token: String, default_channel: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: DEFAULT_DISCORD_API.to_string(),
            token,
            default_channel,
            commit_role_id: None,
        }
    }

    /// Role mentioned in the content of every commit batch.
    pub fn with_commit_role(mut self, role_id: Option<String>) -> Self {
        self.commit_role_id = role_id.filter(|r| !r.is_empty());
        self
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn send(&self, watch: &Watch, message: &Message) -> AppResult<()> {
        let Some(channel) = watch.destination(self.default_channel.as_deref()) else {
            debug!(watch = %watch.id, "no destination channel, skipping");
            return Ok(());
        };

        let url = format!("{}/channels/{}/messages", self.api_base, channel);
        self.client
            .post(&url)
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .header(USER_AGENT, "repowatch")
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::Notifier(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Notifier(e.to_string()))?;

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<ActionRow>,
}

#[derive(Debug, Serialize)]
struct Embed {
    color: u32,
    author: EmbedAuthor,
    title: String,
    url: String,
    description: String,
    fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<EmbedImage>,
    footer: EmbedFooter,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedAuthor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedImage {
    url: String,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: &'static str,
}

#[derive(Debug, Serialize)]
struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    components: Vec<LinkButton>,
}

#[derive(Debug, Serialize)]
struct LinkButton {
    #[serde(rename = "type")]
    kind: u8,
    style: u8,
    label: &'static str,
    url: String,
}

fn link_row(buttons: Vec<(&'static str, String)>) -> ActionRow {
    ActionRow {
        kind: 1,
        components: buttons
            .into_iter()
            .map(|(label, url)| LinkButton {
                kind: 2,
                style: 5,
                label,
                url,
            })
            .collect(),
    }
}

fn field(name: &str, value: String, inline: bool) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value,
        inline,
    }
}

/// Cuts `text` to `limit` characters, marking the cut with "…".
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit).collect();
    format!("{kept}…")
}

fn discord_time(t: Option<DateTime<Utc>>, style: char) -> String {
    match t {
        Some(t) => format!("<t:{}:{}>", t.timestamp(), style),
        None => "Unknown".to_string(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

pub(crate) fn render_new_repository(repo: &RepoInfo) -> Message {
    let description = repo
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| truncate(d, DESCRIPTION_LIMIT))
        .unwrap_or_else(|| "*No description provided.*".to_string());

    let tags = if repo.topics.is_empty() {
        "*No tags*".to_string()
    } else {
        repo.topics
            .iter()
            .map(|t| format!("`{t}`"))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let info = [
        format!("**Owner:** {}", repo.owner_login),
        format!(
            "**Language:** {}",
            repo.language.as_deref().unwrap_or("Unknown")
        ),
        format!("**Stars:** {}", repo.stargazers_count),
        format!("**Created:** {}", discord_time(repo.created_at, 'f')),
        format!("**Updated:** {}", discord_time(repo.updated_at, 'R')),
    ]
    .join("\n");

    Message {
        content: None,
        embeds: vec![Embed {
            color: EMBED_COLOR,
            author: EmbedAuthor {
                name: format!("{} • New Repository", repo.owner_login),
                url: repo.owner_html_url.clone(),
                icon_url: repo.owner_avatar_url.clone(),
            },
            title: format!("🆕 {}", repo.name),
            url: repo.html_url.clone(),
            description,
            fields: vec![
                field("📘 Repository Info", info, false),
                field("🏷️ Tags", tags, false),
            ],
            thumbnail: repo
                .owner_avatar_url
                .clone()
                .map(|url| EmbedImage { url }),
            footer: EmbedFooter { text: FOOTER },
            timestamp: repo.created_at.map(|t| t.to_rfc3339()),
        }],
        components: vec![link_row(vec![
            ("Open on GitHub", repo.html_url.clone()),
            ("Download ZIP", repo.zip_url()),
            ("Clone Repo", repo.clone_url()),
        ])],
    }
}

pub(crate) fn render_release(watch: &Watch, release: &ReleaseInfo) -> Message {
    let description = release
        .body
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .map(|b| truncate(b, DESCRIPTION_LIMIT))
        .unwrap_or_else(|| "*No release notes provided.*".to_string());

    let info = [
        format!("**Repository:** {}", watch.target),
        format!(
            "**Tag:** {}",
            release.tag_name.as_deref().unwrap_or("N/A")
        ),
        format!(
            "**Pre-release:** {}",
            if release.prerelease { "Yes" } else { "No" }
        ),
        format!("**Published:** {}", discord_time(release.published_at, 'f')),
    ]
    .join("\n");

    Message {
        content: None,
        embeds: vec![Embed {
            color: EMBED_COLOR,
            author: EmbedAuthor {
                name: format!("{} • New Release", watch.target),
                url: None,
                icon_url: None,
            },
            title: format!("🚀 {}", release.title()),
            url: release.html_url.clone(),
            description,
            fields: vec![field("📦 Release Info", info, false)],
            thumbnail: None,
            footer: EmbedFooter { text: FOOTER },
            timestamp: release.published_at.map(|t| t.to_rfc3339()),
        }],
        components: vec![],
    }
}

pub(crate) fn render_commit_batch(
    repo: &RepoInfo,
    commits: &[CommitEntry],
    role_id: Option<&str>,
) -> Message {
    let n = commits.len();
    let lines = commits
        .iter()
        .map(|c| {
            let message = if c.short_message.chars().count() > COMMIT_MESSAGE_LIMIT {
                truncate(&c.short_message, COMMIT_MESSAGE_LIMIT - 3)
            } else {
                c.short_message.clone()
            };
            format!(
                "• **{}** — {} _(by {})_",
                c.short_sha(),
                message,
                c.author_name
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Message {
        content: role_id.map(|r| format!("<@&{r}>")),
        embeds: vec![Embed {
            color: EMBED_COLOR,
            author: EmbedAuthor {
                name: format!("{} • {} New Commit{}", repo.full_name, n, plural(n)),
                url: Some(repo.html_url.clone()),
                icon_url: repo.owner_avatar_url.clone(),
            },
            title: format!("📝 {} Commit{} on {}", n, plural(n), repo.default_branch),
            url: repo.commits_url(),
            description: lines,
            fields: vec![
                field("Repository", repo.full_name.clone(), true),
                field("Branch", repo.default_branch.clone(), true),
            ],
            thumbnail: None,
            footer: EmbedFooter { text: FOOTER },
            timestamp: Some(Utc::now().to_rfc3339()),
        }],
        components: vec![link_row(vec![
            ("View Commits", repo.commits_url()),
            ("Open Repo", repo.html_url.clone()),
            ("Clone Repo", repo.clone_url()),
        ])],
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn announce_new_repository(&self, watch: &Watch, repo: &RepoInfo) -> AppResult<()> {
        self.send(watch, &render_new_repository(repo)).await
    }

    async fn announce_release(&self, watch: &Watch, release: &ReleaseInfo) -> AppResult<()> {
        self.send(watch, &render_release(watch, release)).await
    }

    async fn announce_commit_batch(
        &self,
        watch: &Watch,
        repo: &RepoInfo,
        commits: &[CommitEntry],
    ) -> AppResult<()> {
        let message = render_commit_batch(repo, commits, self.commit_role_id.as_deref());
        self.send(watch, &message).await
    }
}
