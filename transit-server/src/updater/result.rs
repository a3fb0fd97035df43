//! Aggregate outcome of a batch of realtime mutations.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use super::{UpdateError, UpdateErrorType, UpdateSuccess, WarningType};

/// Summary of a batch of realtime mutations.
///
/// Built by a single fold over the per-mutation outcomes; successes and
/// errors keep the order the mutations were submitted in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub successful: usize,
    pub failed: usize,
    /// Failures grouped by error type
    pub failures: BTreeMap<UpdateErrorType, Vec<UpdateError>>,
    /// Warnings from every success, flattened
    pub warnings: Vec<WarningType>,
    pub successes: Vec<UpdateSuccess>,
    pub errors: Vec<UpdateError>,
}

impl UpdateResult {
    /// The result of an empty batch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Summarize per-mutation outcomes.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::updater::{
    ///     UpdateError, UpdateErrorType, UpdateResult, UpdateSuccess,
    /// };
    ///
    /// let result = UpdateResult::of_results(vec![
    ///     Ok(UpdateSuccess::no_warnings()),
    ///     Err(UpdateError::no_trip_id(UpdateErrorType::NoTripId)),
    /// ]);
    /// assert_eq!(result.successful, 1);
    /// assert_eq!(result.failed, 1);
    /// assert_eq!(result.failure_count(UpdateErrorType::NoTripId), 1);
    /// ```
    pub fn of_results(
        results: impl IntoIterator<Item = Result<UpdateSuccess, UpdateError>>,
    ) -> Self {
        results
            .into_iter()
            .fold(Self::empty(), |mut acc, outcome| {
                match outcome {
                    Ok(success) => {
                        acc.successful += 1;
                        acc.warnings.extend(success.warnings.iter().copied());
                        acc.successes.push(success);
                    }
                    Err(error) => {
                        acc.failed += 1;
                        acc.failures
                            .entry(error.error_type)
                            .or_default()
                            .push(error.clone());
                        acc.errors.push(error);
                    }
                }
                acc
            })
    }

    /// Number of failures of the given type.
    pub fn failure_count(&self, error_type: UpdateErrorType) -> usize {
        self.failures.get(&error_type).map_or(0, Vec::len)
    }

    /// Number of mutations summarized.
    pub fn total(&self) -> usize {
        self.successful + self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Log the batch outcome, one line per failing error type.
    pub fn log_summary(&self, feed_id: &str) {
        if self.failed == 0 {
            info!(
                feed_id,
                successful = self.successful,
                warnings = self.warnings.len(),
                "Realtime update batch applied"
            );
            return;
        }

        warn!(
            feed_id,
            successful = self.successful,
            failed = self.failed,
            warnings = self.warnings.len(),
            "Realtime update batch applied with failures"
        );
        for (error_type, errors) in &self.failures {
            warn!(feed_id, %error_type, count = errors.len(), "Realtime update failures");
        }
    }
}
