pub mod check_commits;
pub mod check_releases;
pub mod check_user_repos;
pub mod poll_once;

pub use check_commits::{CheckCommitsUseCase, COMMITS_PER_PAGE};
pub use check_releases::{CheckReleasesUseCase, RELEASES_PER_PAGE};
pub use check_user_repos::{CheckUserReposUseCase, USER_REPOS_PER_PAGE};
pub use poll_once::{PollOnceUseCase, TickReport};
