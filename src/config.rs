//! Config
//! ---
//!
//! Evaluation settings, read from a JSON file. Every field is optional.
extern crate serde_json;

use std::fs;
use std::path::Path;

use crate::error::{CvError, Result};
use crate::metrics::DEFAULT_MIN_FP;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
/// Settings shared by every fold of a run
pub struct EvalConfig {
    /// False positive cutoff for logAUC
    pub min_fp: f64,
    /// Report AUC and logAUC relative to a random classifier
    pub adjusted: bool,
    /// Number of cross-validation folds
    pub n_folds: usize,
    /// Seed for fold assignment
    pub seed: u64,
    /// Build dense fingerprint arrays
    pub dense: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            min_fp: DEFAULT_MIN_FP,
            adjusted: false,
            n_folds: 5,
            seed: 42,
            dense: false,
        }
    }
}

impl EvalConfig {
    /// Checks that the settings can be used
    pub fn validate(self) -> Result<Self> {
        if !(self.min_fp > 0. && self.min_fp < 1.) {
            return Err(CvError::Config(format!(
                "min_fp must be in (0, 1), got {}",
                self.min_fp
            )));
        }
        if self.n_folds < 2 {
            return Err(CvError::Config(format!(
                "n_folds must be at least 2, got {}",
                self.n_folds
            )));
        }
        Ok(self)
    }
}

/// Parses and validates a config from JSON text
pub fn parse_config(json: &str) -> Result<EvalConfig> {
    let config: EvalConfig = serde_json::from_str(json)?;
    config.validate()
}

/// Loads the config file at `path`
pub fn load_config(path: &Path) -> Result<EvalConfig> {
    let file_contents = fs::read_to_string(path)?;
    let config = parse_config(&file_contents)?;
    debug!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, EvalConfig::default());
        assert_eq!(config.min_fp, 0.001);
    }

    #[test]
    fn test_partial_config() {
        let config = parse_config(r#"{"min_fp": 0.01, "adjusted": true}"#).unwrap();
        assert_eq!(config.min_fp, 0.01);
        assert!(config.adjusted);
        assert_eq!(config.n_folds, 5);
    }

    #[test]
    fn test_invalid_config() {
        assert!(parse_config(r#"{"min_fp": 1.5}"#).is_err());
        assert!(parse_config(r#"{"n_folds": 1}"#).is_err());
        match parse_config("not json") {
            Err(CvError::Json(_)) => (),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
