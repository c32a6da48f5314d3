use tracing::{error, warn};

use crate::application::usecases::{
    CheckCommitsUseCase, CheckReleasesUseCase, CheckUserReposUseCase,
};
use crate::application::{AppResult, DedupStore, WatchRegistry};
use crate::domain::{Watch, WatchType};

/// Outcome of one pass over every watch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub watches: usize,
    /// Repositories and releases announced plus commits queued.
    pub new_items: usize,
    /// Checker calls abandoned for this tick.
    pub failed_checks: usize,
}

pub struct PollOnceUseCase<'a> {
    pub registry: &'a dyn WatchRegistry,
    pub dedup: &'a dyn DedupStore,
    pub user_repos: CheckUserReposUseCase<'a>,
    pub releases: CheckReleasesUseCase<'a>,
    pub commits: CheckCommitsUseCase<'a>,
}

impl<'a> PollOnceUseCase<'a> {
    /// Runs every watch through its checkers, then persists the ledger once.
    /// A failing checker never stops the rest of the tick.
    pub async fn execute(&self) -> AppResult<TickReport> {
        let watches = self.registry.list().await?;
        let mut report = TickReport {
            watches: watches.len(),
            ..TickReport::default()
        };

        for watch in &watches {
            match watch.kind {
                WatchType::User => {
                    let result = self.user_repos.execute(watch).await;
                    record(&mut report, watch, "repositories", result);
                }
                WatchType::Repo => {
                    let result = self.releases.execute(watch).await;
                    record(&mut report, watch, "releases", result);
                    let result = self.commits.execute(watch).await;
                    record(&mut report, watch, "commits", result);
                }
            }
        }

        if let Err(e) = self.dedup.persist().await {
            error!(error = %e, "failed to persist seen state");
            return Err(e);
        }
        Ok(report)
    }
}

fn record(report: &mut TickReport, watch: &Watch, check: &str, result: AppResult<usize>) {
    match result {
        Ok(n) => report.new_items += n,
        Err(e) => {
            report.failed_checks += 1;
            warn!(watch = %watch.id, check, error = %e, "check failed, retrying next tick");
        }
    }
}
