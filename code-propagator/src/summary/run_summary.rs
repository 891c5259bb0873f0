//! Run summary types.

use super::result::ProcessingResult;

/// Summary of a complete run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of source commits examined.
    pub commits_scanned: usize,

    /// Number of work items queued.
    pub queued: usize,

    /// Whether the scan stopped at a fully propagated commit.
    pub stopped_early: bool,

    /// Number of pull requests opened.
    pub propagated: usize,

    /// Number of repositories whose configuration was recorded.
    pub refreshed: usize,

    /// Number of items skipped.
    pub skipped: usize,

    /// Number of items abandoned because of a concurrent writer.
    pub collisions: usize,

    /// Number of items that failed.
    pub failed: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with a processing result.
    pub fn record_result(&mut self, result: &ProcessingResult) {
        match result {
            ProcessingResult::Propagated { .. } => self.propagated += 1,
            ProcessingResult::Refreshed { .. } => self.refreshed += 1,
            ProcessingResult::Skipped { .. } => self.skipped += 1,
            ProcessingResult::Collision { .. } => self.collisions += 1,
            ProcessingResult::Failed { .. } => self.failed += 1,
        }
    }

    /// Returns true if any failures occurred.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Returns true if all operations were successful.
    ///
    /// Skips and collisions are expected outcomes, not failures.
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.has_failures()
    }
}
