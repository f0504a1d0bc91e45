//! Defines methods shared by the fpcv-eval subcommands

/// Methods for reading arguments
pub mod args;
/// Methods for loading datasets and writing fold outputs
pub mod loaders;
