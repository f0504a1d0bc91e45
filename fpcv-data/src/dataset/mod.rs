//! Dataset
//! ---
//!
//! A molecule list together with the fingerprints and targets defined over it
use std::path::Path;

use self::types::{MolFingerprints, MolList, TargetMap};
use crate::error::Result;
use crate::load::{read_molecules, read_targets};

/// Defines targets, fingerprint records and masks
pub mod types;

#[derive(Debug, Clone)]
/// Everything one cross-validation run reads from disk
pub struct MoleculeDataset {
    /// Canonical molecule order
    pub mol_list: MolList,
    /// Fingerprint records of every molecule in `mol_list`
    pub fingerprints: MolFingerprints,
    /// Targets keyed by target key
    pub targets: TargetMap,
}

impl MoleculeDataset {
    /// Creates a new MoleculeDataset
    pub fn new(mol_list: MolList, fingerprints: MolFingerprints, targets: TargetMap) -> Self {
        MoleculeDataset {
            mol_list,
            fingerprints,
            targets,
        }
    }

    /// Reads a molecules file and a targets file. Molecule order follows the
    /// molecules file.
    pub fn from_files(molecules: &Path, targets: &Path) -> Result<Self> {
        let now = std::time::Instant::now();
        let (mol_list, fingerprints) = read_molecules(molecules)?;
        let targets = read_targets(targets)?;
        info!("Loading runtime (secs): {}", now.elapsed().as_secs());
        Ok(MoleculeDataset::new(mol_list, fingerprints, targets))
    }

    /// Target keys in the order used for array rows
    pub fn target_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.targets.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Total number of fingerprint records
    pub fn num_records(&self) -> usize {
        self.fingerprints.values().map(|v| v.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_from_files() {
        let dir = tempdir().expect("tempdir");
        let mols = dir.path().join("mols.tsv");
        let targets = dir.path().join("targets.tsv");
        {
            let mut f = File::create(&mols).unwrap();
            writeln!(f, "b\t8\t1,2").unwrap();
            writeln!(f, "a\t8\t3").unwrap();
            writeln!(f, "b\t8\t4").unwrap();
            let mut f = File::create(&targets).unwrap();
            writeln!(f, "T2\tt2\t\ta").unwrap();
            writeln!(f, "T1\tt1\t\ta,b").unwrap();
        }
        let ds = MoleculeDataset::from_files(&mols, &targets).expect("should load");
        assert_eq!(ds.mol_list, vec!["b", "a"]);
        assert_eq!(ds.num_records(), 3);
        assert_eq!(ds.target_keys(), vec!["T1", "T2"]);
        assert_eq!(ds.targets["T1"].description, "");
    }
}
