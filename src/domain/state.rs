use serde::{Deserialize, Serialize};

use super::{SeenLedger, Watch};

/// Everything that must survive a restart, in its on-disk shape:
/// `{ watches, seenRepos, seenReleases, seenCommits }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default)]
    pub watches: Vec<Watch>,
    #[serde(flatten)]
    pub seen: SeenLedger,
}
