use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repowatch::application::usecases::{
    CheckCommitsUseCase, CheckReleasesUseCase, CheckUserReposUseCase, PollOnceUseCase,
};
use repowatch::application::{CommitGrouper, DocumentStore, Notifier, Poller};
use repowatch::infrastructure::{
    console_notifier::ConsoleNotifier, discord_notifier::DiscordNotifier,
    document_state::DocumentState, github_client::GitHubClient,
    json_file_store::JsonFileDocumentStore, multi_notifier::MultiNotifier,
    sqlite_store::SqliteDocumentStore, tokio_timer::TokioWindowTimer,
};
use repowatch::interfaces::cli::{run_watch_command, WatchCommand};
use repowatch::interfaces::config::{Config, StorageCfg};
use repowatch::interfaces::http_api::{build_router, ApiState};

#[derive(Parser, Debug)]
#[command(name = "repowatch")]
struct Args {
    /// Path to config.yaml
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Poll once, flush pending commit batches and exit
    #[arg(long)]
    once: bool,

    /// Do not send external notifications (console only)
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage watches
    #[command(subcommand)]
    Watch(WatchCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("repowatch=info".parse().expect("static directive")),
        )
        .init();
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env"));
    }
    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn open_store(cfg: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match &cfg.storage {
        StorageCfg::Json { dir } => Arc::new(JsonFileDocumentStore::new(dir).await?),
        StorageCfg::Sqlite { url } => Arc::new(SqliteDocumentStore::new(url).await?),
    };
    Ok(store)
}

async fn run(args: Args) -> anyhow::Result<()> {
    // 1) load config + state
    let cfg = Config::load(&args.config)?;
    let state = Arc::new(DocumentState::open(open_store(&cfg).await?).await?);

    if let Some(Command::Watch(cmd)) = args.command {
        let reply = run_watch_command(state.as_ref(), cmd).await?;
        println!("{reply}");
        return Ok(());
    }

    // 2) build infra
    let github = GitHubClient::with_base(&cfg.github.api_base, cfg.github.token.clone());

    let mut notifiers: Vec<Box<dyn Notifier>> = vec![];
    notifiers.push(Box::new(ConsoleNotifier::new(cfg.default_channel.clone())));

    if !args.dry_run {
        if let Some(token) = cfg.discord.token.clone() {
            notifiers.push(Box::new(
                DiscordNotifier::new(token, cfg.default_channel.clone())
                    .with_commit_role(cfg.commit_role_id.clone()),
            ));
        } else {
            tracing::warn!("DISCORD_TOKEN not set, DiscordNotifier disabled");
        }
    } else {
        tracing::warn!("--dry-run enabled: only console output");
    }
    if cfg.default_channel.is_none() {
        tracing::warn!("no default channel; watches without a channel are not announced");
    }

    let notifier: Arc<dyn Notifier> = Arc::new(MultiNotifier::new(notifiers));
    let grouper = CommitGrouper::new(
        cfg.group_window(),
        Arc::new(TokioWindowTimer),
        Arc::clone(&notifier),
    );

    if let Some(http) = &cfg.http {
        let router = build_router(ApiState {
            registry: state.clone(),
            api_token: http.api_token.clone(),
        });
        let listener = tokio::net::TcpListener::bind(&http.listen).await?;
        tracing::info!(listen = %http.listen, "http api started");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("http api stopped: {e}");
            }
        });
    }

    // 3) usecases
    let poll_once = PollOnceUseCase {
        registry: state.as_ref(),
        dedup: state.as_ref(),
        user_repos: CheckUserReposUseCase {
            github: &github,
            dedup: state.as_ref(),
            notifier: notifier.as_ref(),
        },
        releases: CheckReleasesUseCase {
            github: &github,
            dedup: state.as_ref(),
            notifier: notifier.as_ref(),
        },
        commits: CheckCommitsUseCase {
            github: &github,
            dedup: state.as_ref(),
            grouper: &grouper,
        },
    };
    let poller = Poller {
        poll_once,
        interval: cfg.poll_interval(),
    };

    // 4) run
    if args.once {
        poller.tick().await;
        let flushed = grouper.flush_all().await?;
        tracing::info!(flushed, "run once completed");
        return Ok(());
    }

    poller
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await;

    // pending batches are flushed, not dropped, on shutdown
    let flushed = grouper.flush_all().await?;
    tracing::info!(flushed, "pending commit batches flushed");
    Ok(())
}
