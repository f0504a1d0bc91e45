//! fpcv
//!
//! fpcv is a library and an executable to evaluate molecular fingerprints
//! by cross-validated target prediction: ROC and precision-recall curves,
//! AUC, logAUC and Youden's J, per fold and across folds.
#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

/// Combining per-target metrics across folds
pub mod aggregate;
/// Tools for binaries
pub mod bin_utils;
/// Evaluation settings
pub mod config;
/// Fold evaluation and output layout
pub mod cv;
/// Error types
pub mod error;
/// Contains the classification metrics
pub mod metrics;

pub use crate::error::{CvError, Result};
