//! Error
//! ---
//!
//! Errors raised while building, splitting, reading or writing fingerprint data
use thiserror::Error;

/// Errors for the data layer. None of these are recovered from internally
#[derive(Debug, Error)]
pub enum DataError {
    /// Underlying storage failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive could not be encoded or decoded
    #[error("archive codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Malformed line in an input file
    #[error("parse error on line {line}: {msg}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        msg: String,
    },

    /// A target references a molecule that is not in the molecule list
    #[error("target `{target}` references unknown molecule `{molecule}`")]
    UnknownMolecule {
        /// Target key
        target: String,
        /// Offending molecule id
        molecule: String,
    },

    /// A target key is missing from the target map
    #[error("unknown target `{0}`")]
    UnknownTarget(String),

    /// Fingerprint molecules and the molecule list disagree
    #[error("molecule set mismatch: {missing} in list without fingerprints, {extra} with fingerprints not in list")]
    MoleculeSetMismatch {
        /// Molecules in the list without any fingerprint
        missing: usize,
        /// Molecules with fingerprints that are not in the list
        extra: usize,
    },

    /// A fingerprint sets a bit outside of its width
    #[error("molecule `{molecule}` sets bit {bit} but fingerprints are {width} bits wide")]
    BitOutOfRange {
        /// Molecule id
        molecule: String,
        /// Offending bit
        bit: usize,
        /// Expected width
        width: usize,
    },

    /// Dimensions of inputs don't line up
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Mask contains a value outside of {-1, 0, 1}
    #[error("invalid mask value {value} at ({row}, {col})")]
    InvalidMask {
        /// Row of the value
        row: usize,
        /// Column of the value
        col: usize,
        /// The value
        value: i8,
    },

    /// Archive decoded but its fields are inconsistent
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// Bad arguments
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result alias used throughout the data crate
pub type Result<T> = std::result::Result<T, DataError>;
