//! Errors surfaced by cross-validation runs
extern crate fp_data;

use self::fp_data::DataError;
use thiserror::Error;

use crate::metrics::MetricError;

/// Anything that stops a run. Nothing here is retried
#[derive(Debug, Error)]
pub enum CvError {
    /// Reading, building or splitting data failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// A metric could not be computed
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// A metric could not be computed for one target
    #[error("target `{target}`: {source}")]
    Target {
        /// Target key
        target: String,
        /// What went wrong
        source: MetricError,
    },

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// Storage failure outside of the data layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON config or output could not be handled
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for cross-validation runs
pub type Result<T> = std::result::Result<T, CvError>;
