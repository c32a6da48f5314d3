use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One identifier that may already have been announced for a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seen<'a> {
    /// Repository full name, keyed by the watched username.
    Repository(&'a str),
    /// Release id, keyed by the watched repository.
    Release(u64),
    /// Commit SHA, keyed by the watched repository.
    Commit(&'a str),
}

/// The dedup ledger. Entries are only ever appended.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeenLedger {
    #[serde(default)]
    pub seen_repos: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub seen_releases: BTreeMap<String, Vec<u64>>,
    #[serde(default)]
    pub seen_commits: BTreeMap<String, Vec<String>>,
}

impl SeenLedger {
    pub fn contains(&self, target: &str, item: Seen<'_>) -> bool {
        match item {
            Seen::Repository(name) => contains_str(&self.seen_repos, target, name),
            Seen::Release(id) => self
                .seen_releases
                .get(target)
                .is_some_and(|ids| ids.contains(&id)),
            Seen::Commit(sha) => contains_str(&self.seen_commits, target, sha),
        }
    }

    /// Records `item`; returns false when it was already present.
    pub fn insert(&mut self, target: &str, item: Seen<'_>) -> bool {
        if self.contains(target, item) {
            return false;
        }
        match item {
            Seen::Repository(name) => push_str(&mut self.seen_repos, target, name),
            Seen::Release(id) => self
                .seen_releases
                .entry(target.to_string())
                .or_default()
                .push(id),
            Seen::Commit(sha) => push_str(&mut self.seen_commits, target, sha),
        }
        true
    }

    /// Total identifiers across every partition.
    pub fn len(&self) -> usize {
        self.seen_repos.values().map(Vec::len).sum::<usize>()
            + self.seen_releases.values().map(Vec::len).sum::<usize>()
            + self.seen_commits.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn contains_str(map: &BTreeMap<String, Vec<String>>, target: &str, value: &str) -> bool {
    map.get(target)
        .is_some_and(|values| values.iter().any(|v| v == value))
}

fn push_str(map: &mut BTreeMap<String, Vec<String>>, target: &str, value: &str) {
    map.entry(target.to_string())
        .or_default()
        .push(value.to_string());
}
