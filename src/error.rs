//! Error types for record validation and aggregation.

use crate::models::DatasetKind;

/// Errors raised while turning raw dataset records into a report.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// A record is missing a required field or has a field of the wrong type.
    #[error("malformed record #{index} in {dataset} dataset: {reason}")]
    MalformedRecord {
        dataset: DatasetKind,
        index: usize,
        reason: String,
    },
}

impl AggregationError {
    pub fn malformed(dataset: DatasetKind, index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            dataset,
            index,
            reason: reason.into(),
        }
    }
}
