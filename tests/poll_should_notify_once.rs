mod common;

use common::{Announcement, Harness, WINDOW};
use repowatch::application::WatchRegistry;
use repowatch::domain::WatchType;
use repowatch::infrastructure::fake_github::{commit_fixture, release_fixture, repo_fixture};

#[tokio::test(start_paused = true)]
async fn second_tick_announces_nothing_new() {
    let h = Harness::new().await;
    h.state.add(WatchType::User, "octocat", None).await.unwrap();
    h.state.add(WatchType::Repo, "acme/widget", None).await.unwrap();
    h.github
        .set_user_repos("octocat", vec![repo_fixture("octocat/hello")]);
    h.github
        .set_releases("acme/widget", vec![release_fixture(7, "v1.0.0")]);
    h.github.set_commits(
        repo_fixture("acme/widget"),
        vec![commit_fixture("c1", "init")],
    );

    let first = h.poll_once().execute().await.unwrap();
    tokio::time::sleep(WINDOW * 2).await;
    let second = h.poll_once().execute().await.unwrap();
    tokio::time::sleep(WINDOW * 2).await;

    assert_eq!(first.new_items, 3);
    assert_eq!(second.new_items, 0);
    assert_eq!(
        h.notifier.sent(),
        vec![
            Announcement::Repository {
                watch: "user:octocat".into(),
                repo: "octocat/hello".into()
            },
            Announcement::Release {
                watch: "repo:acme/widget".into(),
                id: 7
            },
            Announcement::Commits {
                watch: "repo:acme/widget".into(),
                shas: vec!["c1".into()]
            },
        ]
    );
}

#[tokio::test]
async fn first_poll_announces_every_existing_repository_oldest_first() {
    let h = Harness::new().await;
    h.state.add(WatchType::User, "octocat", None).await.unwrap();
    // newest first, as the API lists them
    h.github.set_user_repos(
        "octocat",
        vec![
            repo_fixture("octocat/three"),
            repo_fixture("octocat/two"),
            repo_fixture("octocat/one"),
        ],
    );

    let report = h.poll_once().execute().await.unwrap();

    assert_eq!(report.watches, 1);
    assert_eq!(report.new_items, 3);
    let repos: Vec<String> = h
        .notifier
        .sent()
        .into_iter()
        .filter_map(|a| match a {
            Announcement::Repository { repo, .. } => Some(repo),
            _ => None,
        })
        .collect();
    assert_eq!(repos, vec!["octocat/one", "octocat/two", "octocat/three"]);
    assert_eq!(
        h.doc().seen.seen_repos["octocat"],
        vec!["octocat/one", "octocat/two", "octocat/three"]
    );
}

#[tokio::test]
async fn new_repository_appears_between_ticks() {
    let h = Harness::new().await;
    h.state.add(WatchType::User, "octocat", None).await.unwrap();
    h.github
        .set_user_repos("octocat", vec![repo_fixture("octocat/one")]);
    h.poll_once().execute().await.unwrap();

    h.github.set_user_repos(
        "octocat",
        vec![repo_fixture("octocat/two"), repo_fixture("octocat/one")],
    );
    let report = h.poll_once().execute().await.unwrap();

    assert_eq!(report.new_items, 1);
    assert_eq!(
        h.notifier.sent().last(),
        Some(&Announcement::Repository {
            watch: "user:octocat".into(),
            repo: "octocat/two".into()
        })
    );
}

#[tokio::test]
async fn releases_are_announced_oldest_first_and_keyed_by_id() {
    let h = Harness::new().await;
    h.state.add(WatchType::Repo, "acme/widget", None).await.unwrap();
    h.github.set_commits(repo_fixture("acme/widget"), vec![]);
    h.github.set_releases(
        "acme/widget",
        vec![release_fixture(12, "v1.1.0"), release_fixture(11, "v1.0.0")],
    );

    h.poll_once().execute().await.unwrap();
    h.poll_once().execute().await.unwrap();

    let ids: Vec<u64> = h
        .notifier
        .sent()
        .into_iter()
        .filter_map(|a| match a {
            Announcement::Release { id, .. } => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec![11, 12]);
    assert_eq!(h.doc().seen.seen_releases["acme/widget"], vec![11, 12]);
}

#[tokio::test]
async fn failed_announcement_is_not_retried() {
    let h = Harness::new().await;
    h.state.add(WatchType::User, "octocat", None).await.unwrap();
    h.github
        .set_user_repos("octocat", vec![repo_fixture("octocat/hello")]);
    h.notifier.fail_all(true);

    let report = h.poll_once().execute().await.unwrap();
    h.notifier.fail_all(false);
    h.poll_once().execute().await.unwrap();

    assert_eq!(report.failed_checks, 0);
    assert_eq!(h.notifier.sent().len(), 1);
    assert_eq!(h.doc().seen.seen_repos["octocat"], vec!["octocat/hello"]);
}

#[tokio::test]
async fn every_tick_persists_the_ledger() {
    let h = Harness::new().await;
    let before = h.store.writes();

    h.poll_once().execute().await.unwrap();
    h.poll_once().execute().await.unwrap();

    assert_eq!(h.store.writes(), before + 2);
}
