use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::github_client::DEFAULT_API_BASE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_group_window_ms")]
    pub group_window_ms: u64,
    /// Channel used when a watch has none of its own.
    pub default_channel: Option<String>,
    /// Role mentioned on commit batches.
    pub commit_role_id: Option<String>,
    #[serde(default)]
    pub storage: StorageCfg,
    #[serde(default)]
    pub github: GitHubCfg,
    #[serde(default)]
    pub discord: DiscordCfg,
    pub http: Option<HttpCfg>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend")]
pub enum StorageCfg {
    #[serde(rename = "json")]
    Json {
        #[serde(default = "default_storage_dir")]
        dir: PathBuf,
    },
    #[serde(rename = "sqlite")]
    Sqlite { url: String },
}

impl Default for StorageCfg {
    fn default() -> Self {
        StorageCfg::Json {
            dir: default_storage_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCfg {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub token: Option<String>,
}

impl Default for GitHubCfg {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordCfg {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpCfg {
    pub listen: String,
    pub api_token: Option<String>,
}

fn default_poll_interval_seconds() -> u64 {
    120
}

fn default_group_window_ms() -> u64 {
    10_000
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval_seconds(),
            group_window_ms: default_group_window_ms(),
            default_channel: None,
            commit_role_id: None,
            storage: StorageCfg::default(),
            github: GitHubCfg::default(),
            discord: DiscordCfg::default(),
            http: None,
        }
    }
}

impl Config {
    /// Reads the YAML file if it exists, applies environment overrides and
    /// validates the result. A missing file means defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut cfg = if Path::new(path).exists() {
            Self::load_from_file(path)?
        } else {
            tracing::warn!(path, "config file not found, using defaults");
            Self::default()
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let raw = expand_env(raw);
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&raw)?;
        Ok(cfg)
    }

    /// Environment variables win over the file.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let get = |k: &str| get(k).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("POLL_INTERVAL_SECONDS") {
            self.poll_interval_seconds = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("POLL_INTERVAL_SECONDS={v}: {e}"))?;
        }
        if let Some(v) = get("GROUP_WINDOW_MS") {
            self.group_window_ms = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("GROUP_WINDOW_MS={v}: {e}"))?;
        }
        if let Some(v) = get("DEFAULT_ANNOUNCE_CHANNEL_ID") {
            self.default_channel = Some(v);
        }
        if let Some(v) = get("COMMIT_ROLE_ID") {
            self.commit_role_id = Some(v);
        }
        if let Some(v) = get("DISCORD_TOKEN") {
            self.discord.token = Some(v);
        }
        if let Some(v) = get("GITHUB_TOKEN") {
            self.github.token = Some(v);
        }
        if let Some(v) = get("DATABASE_URL") {
            self.storage = StorageCfg::Sqlite { url: v };
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_seconds == 0 {
            anyhow::bail!("poll_interval_seconds must be greater than zero");
        }
        if self.group_window_ms == 0 {
            anyhow::bail!("group_window_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn group_window(&self) -> Duration {
        Duration::from_millis(self.group_window_ms)
    }
}

/// very small ${VAR} expansion to keep config simple
fn expand_env(s: &str) -> String {
    let mut out = s.to_string();
    for (k, v) in std::env::vars() {
        out = out.replace(&format!("${{{}}}", k), &v);
    }
    out
}
