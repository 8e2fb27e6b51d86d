//! Post-hoc batch statistics

use std::time::Duration;

use serde::Serialize;

use super::BatchResult;

/// Aggregates computed from a finished result list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStats {
    /// Items submitted
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mean per-item validation time over completed items
    pub average_duration: Duration,
    pub wall_clock: Duration,
    /// Completed items per second of wall clock
    pub throughput: f64,
}

impl BatchStats {
    pub fn from_results(total: usize, results: &[BatchResult], wall_clock: Duration) -> Self {
        let succeeded = results.iter().filter(|r| r.result.success).count();
        let failed = results.len() - succeeded;

        let average_duration = if results.is_empty() {
            Duration::ZERO
        } else {
            results.iter().map(|r| r.duration).sum::<Duration>() / results.len() as u32
        };

        let seconds = wall_clock.as_secs_f64();
        let throughput = if seconds > 0.0 {
            results.len() as f64 / seconds
        } else {
            0.0
        };

        Self {
            total,
            succeeded,
            failed,
            average_duration,
            wall_clock,
            throughput,
        }
    }

    /// Succeeded share of completed items, 0.0 when nothing completed
    pub fn success_rate(&self) -> f64 {
        let completed = self.succeeded + self.failed;
        if completed == 0 {
            0.0
        } else {
            self.succeeded as f64 / completed as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ValidationError, ValidationIssue, ValidationResult};

    fn result(index: usize, success: bool, millis: u64) -> BatchResult {
        BatchResult {
            index,
            identifier: None,
            result: if success {
                ValidationResult::success(None)
            } else {
                ValidationResult::failure(ValidationError::new(ValidationIssue::custom("bad")))
            },
            duration: Duration::from_millis(millis),
            started: Duration::ZERO,
            finished: Duration::from_millis(millis),
        }
    }

    #[test]
    fn test_stats_from_results() {
        let results = vec![result(0, true, 10), result(1, false, 30)];
        let stats = BatchStats::from_results(3, &results, Duration::from_secs(2));

        assert_eq!(stats.total, 3);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.average_duration, Duration::from_millis(20));
        assert!((stats.throughput - 1.0).abs() < f64::EPSILON);
        assert!((stats.success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_results() {
        let stats = BatchStats::from_results(0, &[], Duration::ZERO);
        assert_eq!(stats.average_duration, Duration::ZERO);
        assert_eq!(stats.throughput, 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }
}
