use std::fmt;

use serde::{Deserialize, Serialize};

/// A persisted subscription: what to poll and where to announce it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watch {
    pub id: String, // "user:<login>" or "repo:<owner/repo>", lower-cased
    #[serde(rename = "type")]
    pub kind: WatchType,
    pub target: String,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchType {
    User,
    Repo,
}

impl WatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchType::User => "user",
            WatchType::Repo => "repo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Some(WatchType::User),
            "repo" => Some(WatchType::Repo),
            _ => None,
        }
    }
}

impl fmt::Display for WatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Watch {
    pub fn new(kind: WatchType, target: impl Into<String>, channel: Option<String>) -> Self {
        let target = target.into().trim().to_string();
        let channel = channel
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Self {
            id: Self::make_id(kind, &target),
            kind,
            target,
            channel,
        }
    }

    pub fn make_id(kind: WatchType, target: &str) -> String {
        format!("{}:{}", kind.as_str(), target.trim().to_lowercase())
    }

    /// Where announcements for this watch go, if anywhere.
    pub fn destination<'a>(&'a self, default_channel: Option<&'a str>) -> Option<&'a str> {
        self.channel.as_deref().or(default_channel)
    }
}
