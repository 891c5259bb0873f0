//! Values exchanged with the code host.

use super::HostError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A repository on the code host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoName {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name.
    pub name: String,
}

impl RepoName {
    /// Creates a repository reference.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Full repository name in "owner/name" format.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoName {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(HostError::InvalidRepoName(s.to_string())),
        }
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// An existing issue or pull request, as far as existence checks care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Issue or pull request number.
    pub number: u64,

    /// Title.
    pub title: String,

    /// Body, empty when the artifact has none.
    pub body: String,
}

impl Artifact {
    /// Returns whether the title or body mentions `text`.
    #[must_use]
    pub fn mentions(&self, text: &str) -> bool {
        self.title.contains(text) || self.body.contains(text)
    }
}

/// An issue or pull request that was just created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedArtifact {
    /// Issue or pull request number.
    pub number: u64,

    /// Web URL.
    pub url: String,
}

/// A pull request to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    /// Title.
    pub title: String,

    /// Branch holding the changes.
    pub head: String,

    /// Branch the changes should be merged into.
    pub base: String,

    /// Rendered body.
    pub body: String,
}
