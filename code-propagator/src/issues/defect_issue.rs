//! Configuration defect issue information.

use crate::host::RepoName;

/// An issue reporting a configuration defect in a destination repository.
#[derive(Debug, Clone)]
pub struct DefectIssue {
    /// Target repository.
    pub repository: RepoName,

    /// Issue title.
    pub title: String,

    /// Filing status.
    pub status: super::IssueStatus,
}
