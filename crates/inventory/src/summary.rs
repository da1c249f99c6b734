use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::InventoryProgress;

/// Immutable result of a finished stock-take pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    /// Materials shown to the operator at least once.
    pub processed_count: usize,
    /// Materials whose count was durably committed (or already matched).
    pub saved_count: usize,
    pub total_count: usize,
    pub finished_at: DateTime<Utc>,
}

impl CompletionSummary {
    pub fn from_progress(progress: &InventoryProgress, finished_at: DateTime<Utc>) -> Self {
        Self {
            processed_count: progress.visited_count,
            saved_count: progress.saved_count,
            total_count: progress.total_count,
            finished_at,
        }
    }

    pub fn unprocessed_count(&self) -> usize {
        self.total_count.saturating_sub(self.processed_count)
    }

    pub fn completion_percentage(&self) -> u8 {
        if self.total_count == 0 {
            return 0;
        }
        ((self.processed_count * 200 + self.total_count) / (2 * self.total_count)).min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(processed: usize, saved: usize, total: usize) -> CompletionSummary {
        CompletionSummary {
            processed_count: processed,
            saved_count: saved,
            total_count: total,
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn unprocessed_is_never_negative() {
        assert_eq!(summary(2, 1, 5).unprocessed_count(), 3);
        assert_eq!(summary(5, 5, 5).unprocessed_count(), 0);
        assert_eq!(summary(6, 0, 5).unprocessed_count(), 0);
    }

    #[test]
    fn completion_percentage_handles_empty_pass() {
        assert_eq!(summary(0, 0, 0).completion_percentage(), 0);
        assert_eq!(summary(1, 0, 3).completion_percentage(), 33);
        assert_eq!(summary(2, 2, 3).completion_percentage(), 67);
    }

    #[test]
    fn built_from_progress_snapshot() {
        let progress = InventoryProgress {
            visited_count: 4,
            saved_count: 3,
            total_count: 9,
            cursor: 3,
            percentage: 44,
        };
        let s = CompletionSummary::from_progress(&progress, Utc::now());
        assert_eq!((s.processed_count, s.saved_count, s.total_count), (4, 3, 9));
    }
}
