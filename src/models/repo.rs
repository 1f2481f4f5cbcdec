//! Repository references and parsing.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A reference to a GitHub repository (`owner/name`).
///
/// Accepts the forms users actually paste:
/// - `owner/repo`
/// - `https://github.com/owner/repo` (with or without `.git`)
/// - `git@github.com:owner/repo.git`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoRef {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoRef {
    /// Creates a repository reference from explicit parts.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Returns the `owner/name` slug.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s
            .trim()
            .trim_start_matches("https://github.com/")
            .trim_start_matches("http://github.com/")
            .trim_start_matches("git@github.com:")
            .trim_end_matches('/')
            .trim_end_matches(".git");

        let mut parts = trimmed.split('/').filter(|p| !p.is_empty());
        let (owner, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => (owner, name),
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "repository reference '{s}' does not resolve to owner/name"
                )));
            },
        };

        Ok(Self::new(owner, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("octocat/hello-world"; "bare slug")]
    #[test_case("https://github.com/octocat/hello-world"; "https url")]
    #[test_case("https://github.com/octocat/hello-world.git"; "https url with git suffix")]
    #[test_case("git@github.com:octocat/hello-world.git"; "ssh remote")]
    #[test_case("https://github.com/octocat/hello-world/"; "trailing slash")]
    fn test_parse_accepted_forms(input: &str) {
        let repo: RepoRef = input.parse().unwrap();
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.name, "hello-world");
        assert_eq!(repo.slug(), "octocat/hello-world");
    }

    #[test_case(""; "empty")]
    #[test_case("just-an-owner"; "missing name")]
    #[test_case("a/b/c"; "too many segments")]
    fn test_parse_rejected_forms(input: &str) {
        let result: Result<RepoRef> = input.parse();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_display_matches_slug() {
        let repo = RepoRef::new("octocat", "hello-world");
        assert_eq!(repo.to_string(), repo.slug());
    }
}
