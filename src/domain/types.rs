use std::fmt;

use serde::{Deserialize, Serialize};

/// `owner/repo` as typed by the operator. Case is preserved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    pub fn parse(s: &str) -> Result<Self, RepoIdError> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 2 || !is_name_segment(parts[0]) || !is_name_segment(parts[1]) {
            return Err(RepoIdError::InvalidFormat(s.to_string()));
        }
        Ok(Self {
            owner: parts[0].to_string(),
            name: parts[1].to_string(),
        })
    }
}

/// A user, org or repository name as GitHub allows it in a URL path:
/// ASCII letters, digits, `-`, `_` and `.`.
pub fn is_name_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum RepoIdError {
    #[error("invalid repo id format: {0} (expected owner/repo)")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let id = RepoId::parse(" Acme/Widget.rs ").unwrap();
        assert_eq!(id.to_string(), "Acme/Widget.rs");
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["acme", "acme/", "/widget", "a/b/c", "", "acme/w?x", "acme/w#x", "ac me/w"] {
            assert!(RepoId::parse(bad).is_err(), "{bad} should be rejected");
        }
    }
}
