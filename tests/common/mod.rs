#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use repowatch::application::usecases::{
    CheckCommitsUseCase, CheckReleasesUseCase, CheckUserReposUseCase, PollOnceUseCase,
};
use repowatch::application::{AppError, AppResult, CommitGrouper, Notifier};
use repowatch::domain::{CommitEntry, ReleaseInfo, RepoInfo, StateDocument, Watch};
use repowatch::infrastructure::{
    document_state::DocumentState, fake_github::FakeGitHub, memory_store::InMemoryDocumentStore,
    tokio_timer::TokioWindowTimer,
};

pub const WINDOW: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Announcement {
    Repository { watch: String, repo: String },
    Release { watch: String, id: u64 },
    Commits { watch: String, shas: Vec<String> },
}

#[derive(Default)]
struct Recorded {
    sent: Vec<Announcement>,
    fail: bool,
    delay: Option<Duration>,
}

/// Records what would have been announced.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Announcement> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.sent()
            .into_iter()
            .filter_map(|a| match a {
                Announcement::Commits { shas, .. } => Some(shas),
                _ => None,
            })
            .collect()
    }

    /// Every announcement is recorded, then reported as failed.
    pub fn fail_all(&self, fail: bool) {
        self.inner.lock().unwrap().fail = fail;
    }

    /// Commit batch delivery takes this long.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().delay = Some(delay);
    }

    fn push(&self, a: Announcement) -> (bool, Option<Duration>) {
        let mut inner = self.inner.lock().unwrap();
        inner.sent.push(a);
        (inner.fail, inner.delay)
    }
}

fn outcome(fail: bool) -> AppResult<()> {
    if fail {
        Err(AppError::Notifier("channel unavailable".into()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn announce_new_repository(&self, watch: &Watch, repo: &RepoInfo) -> AppResult<()> {
        let (fail, _) = self.push(Announcement::Repository {
            watch: watch.id.clone(),
            repo: repo.full_name.clone(),
        });
        outcome(fail)
    }

    async fn announce_release(&self, watch: &Watch, release: &ReleaseInfo) -> AppResult<()> {
        let (fail, _) = self.push(Announcement::Release {
            watch: watch.id.clone(),
            id: release.id,
        });
        outcome(fail)
    }

    async fn announce_commit_batch(
        &self,
        watch: &Watch,
        _repo: &RepoInfo,
        commits: &[CommitEntry],
    ) -> AppResult<()> {
        let (fail, delay) = self.push(Announcement::Commits {
            watch: watch.id.clone(),
            shas: commits.iter().map(|c| c.sha.clone()).collect(),
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome(fail)
    }
}

/// Fake GitHub, in-memory state and a recording notifier wired together.
pub struct Harness {
    pub github: FakeGitHub,
    pub store: InMemoryDocumentStore,
    pub state: Arc<DocumentState>,
    pub notifier: Arc<RecordingNotifier>,
    pub grouper: CommitGrouper,
}

impl Harness {
    pub async fn new() -> Self {
        let store = InMemoryDocumentStore::new();
        let state = Arc::new(DocumentState::open(Arc::new(store.clone())).await.unwrap());
        let notifier = Arc::new(RecordingNotifier::new());
        let grouper = CommitGrouper::new(WINDOW, Arc::new(TokioWindowTimer), notifier.clone());
        Self {
            github: FakeGitHub::new(),
            store,
            state,
            notifier,
            grouper,
        }
    }

    pub fn poll_once(&self) -> PollOnceUseCase<'_> {
        PollOnceUseCase {
            registry: self.state.as_ref(),
            dedup: self.state.as_ref(),
            user_repos: CheckUserReposUseCase {
                github: &self.github,
                dedup: self.state.as_ref(),
                notifier: self.notifier.as_ref(),
            },
            releases: CheckReleasesUseCase {
                github: &self.github,
                dedup: self.state.as_ref(),
                notifier: self.notifier.as_ref(),
            },
            commits: CheckCommitsUseCase {
                github: &self.github,
                dedup: self.state.as_ref(),
                grouper: &self.grouper,
            },
        }
    }

    pub fn doc(&self) -> StateDocument {
        self.state.snapshot().unwrap()
    }
}
