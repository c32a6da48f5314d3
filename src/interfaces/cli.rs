use clap::Subcommand;

use crate::application::{AppError, AppResult, WatchRegistry};
use crate::domain::{Watch, WatchType};

/// Offline edits of the watch list. While the daemon runs, use the HTTP API
/// instead; the daemon's in-memory state would overwrite these edits.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    /// Watch a GitHub user/org for new repositories
    AddUser {
        username: String,
        /// Channel ID (defaults to the configured channel)
        #[arg(long)]
        channel: Option<String>,
    },
    /// Watch a GitHub repo (owner/repo) for releases and commits
    AddRepo {
        repo: String,
        /// Channel ID (defaults to the configured channel)
        #[arg(long)]
        channel: Option<String>,
    },
    /// Remove a watch by ID
    Remove { id: String },
    /// List all watches
    List,
}

/// Runs `cmd` and returns the reply for the operator.
pub async fn run_watch_command(
    registry: &dyn WatchRegistry,
    cmd: WatchCommand,
) -> AppResult<String> {
    match cmd {
        WatchCommand::AddUser { username, channel } => {
            match registry.add(WatchType::User, &username, channel).await {
                Ok(w) => Ok(format!("Watching GitHub user {} ({})", w.target, w.id)),
                Err(AppError::Conflict(_)) => Ok("Already watching this user.".to_string()),
                Err(e) => Err(e),
            }
        }
        WatchCommand::AddRepo { repo, channel } => {
            match registry.add(WatchType::Repo, &repo, channel).await {
                Ok(w) => Ok(format!("Watching repo {} ({})", w.target, w.id)),
                Err(AppError::Conflict(_)) => Ok("Already watching this repo.".to_string()),
                Err(e) => Err(e),
            }
        }
        WatchCommand::Remove { id } => match registry.remove(&id).await {
            Ok(w) => Ok(format!("Removed {}", w.id)),
            Err(AppError::NotFound(_)) => Ok("Watch ID not found.".to_string()),
            Err(e) => Err(e),
        },
        WatchCommand::List => {
            let watches = registry.list().await?;
            if watches.is_empty() {
                return Ok("No watches configured.".to_string());
            }
            Ok(watches
                .iter()
                .map(describe)
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

fn describe(w: &Watch) -> String {
    format!(
        "• {} → {} (type: {}, channel: {})",
        w.id,
        w.target,
        w.kind,
        w.channel.as_deref().unwrap_or("default")
    )
}
