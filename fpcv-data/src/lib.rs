//! Library for fingerprint and target data used in cross-validation
#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

/// Saving and loading fingerprint matrices
pub mod archive;
/// Building target and fingerprint matrices
pub mod arrays;
/// Molecule datasets and their types
pub mod dataset;
/// Sparse and dense boolean matrices
pub mod datatypes;
/// Error types
pub mod error;
/// Train/test splitting
pub mod folds;
/// Defines methods for loading data from a file
pub mod load;

pub use crate::error::{DataError, Result};
