//! Folds
//! ---
//!
//! Splits molecules and targets into train and test sets for one
//! cross-validation fold, and generates per-target fold masks
use hashbrown;
use rand;
use rand_xorshift;

use self::hashbrown::HashSet;
use self::rand::seq::SliceRandom;
use self::rand::SeedableRng;
use self::rand_xorshift::XorShiftRng;

use crate::dataset::types::{MolFingerprints, Target, TargetMap, TrainTestMask};
use crate::datatypes::BoolCsrMatrix;
use crate::error::{DataError, Result};

/// Train and test halves of one fold
#[derive(Debug, Clone)]
pub struct FoldSplit {
    /// Fingerprints of molecules used for training by at least one target
    pub train_fps: MolFingerprints,
    /// Targets with every positive not pulled into the test set
    pub train_targets: TargetMap,
    /// Fingerprints of molecules tested by at least one target
    pub test_fps: MolFingerprints,
    /// Targets restricted to their test positives
    pub test_targets: TargetMap,
}

/// Splits data by a train/test mask.
///
/// A molecule goes to the test fingerprints if any target marks it 1 and to
/// the train fingerprints if any target marks it -1, so it may land in both.
/// For each target, test positives are its binders marked 1 in its row; train
/// positives are all of its other binders, whatever their mask value.
pub fn split_by_mask(
    mol_fps: &MolFingerprints,
    mol_list: &[String],
    target_map: &TargetMap,
    target_keys: &[String],
    mask: &TrainTestMask,
) -> Result<FoldSplit> {
    if mask.shape() != (target_keys.len(), mol_list.len()) {
        return Err(DataError::ShapeMismatch(format!(
            "mask is {:?} but there are {} targets and {} molecules",
            mask.shape(),
            target_keys.len(),
            mol_list.len()
        )));
    }

    let pick = |value: i8| -> Result<MolFingerprints> {
        let mut fps = MolFingerprints::new();
        for (j, mol) in mol_list.iter().enumerate() {
            if mask.column_has(j, value) {
                let records = mol_fps.get(mol).ok_or_else(|| {
                    DataError::InvalidInput(format!("no fingerprints for molecule `{}`", mol))
                })?;
                fps.insert(mol.clone(), records.clone());
            }
        }
        Ok(fps)
    };
    let test_fps = pick(1)?;
    let train_fps = pick(-1)?;

    let mut test_targets = TargetMap::with_capacity(target_keys.len());
    let mut train_targets = TargetMap::with_capacity(target_keys.len());
    for (i, key) in target_keys.iter().enumerate() {
        let target = target_map
            .get(key)
            .ok_or_else(|| DataError::UnknownTarget(key.clone()))?;
        let test_mols: HashSet<&str> = mask
            .row(i)
            .iter()
            .zip(mol_list.iter())
            .filter(|&(&v, _)| v == 1)
            .map(|(_, m)| m.as_str())
            .collect();

        let (mut test_cids, mut train_cids): (Vec<String>, Vec<String>) = target
            .cids
            .iter()
            .cloned()
            .partition(|c| test_mols.contains(c.as_str()));
        test_cids.sort();
        test_cids.dedup();
        train_cids.sort();
        train_cids.dedup();

        test_targets.insert(
            key.clone(),
            Target::new(&target.name, test_cids, &target.description),
        );
        train_targets.insert(
            key.clone(),
            Target::new(&target.name, train_cids, &target.description),
        );
    }

    Ok(FoldSplit {
        train_fps,
        train_targets,
        test_fps,
        test_targets,
    })
}

/// Builds one mask per fold from a target x molecule association matrix.
///
/// Each target's binders are shuffled and dealt round-robin into `n_folds`
/// folds. In the mask of fold `f`, binders dealt to `f` are 1, the target's
/// other binders are -1 and everything else is 0.
pub fn kfold_masks(
    association: &BoolCsrMatrix,
    n_folds: usize,
    seed: u64,
) -> Result<Vec<TrainTestMask>> {
    if n_folds < 2 {
        return Err(DataError::InvalidInput(format!(
            "need at least 2 folds, got {}",
            n_folds
        )));
    }
    let shape = association.shape();
    let mut masks = vec![TrainTestMask::zeros(shape); n_folds];
    let mut rng = XorShiftRng::seed_from_u64(seed);
    for i in 0..shape.0 {
        let mut positives = association.row(i).to_vec();
        positives.shuffle(&mut rng);
        for (k, &j) in positives.iter().enumerate() {
            let fold = k % n_folds;
            for (f, mask) in masks.iter_mut().enumerate() {
                mask.set(i, j, if f == fold { 1 } else { -1 })?;
            }
        }
        if positives.len() < n_folds {
            warn!(
                "target row {} has {} binders for {} folds; some folds test nothing",
                i,
                positives.len(),
                n_folds
            );
        }
    }
    Ok(masks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::types::FingerprintRecord;

    fn fixture() -> (MolFingerprints, Vec<String>, TargetMap, Vec<String>) {
        let mol_list: Vec<String> = (0..4).map(|i| format!("mol{}", i)).collect();
        let mut fps = MolFingerprints::new();
        for (i, m) in mol_list.iter().enumerate() {
            fps.insert(m.clone(), vec![FingerprintRecord::new(8, vec![i])]);
        }
        let mut targets = TargetMap::new();
        targets.insert(
            "T1".into(),
            Target::new(
                "one",
                vec!["mol0".into(), "mol1".into(), "mol3".into()],
                "desc",
            ),
        );
        (fps, mol_list, targets, vec!["T1".into()])
    }

    #[test]
    fn test_split_by_mask() {
        let (fps, mol_list, targets, keys) = fixture();
        let mask = TrainTestMask::from_rows(&[vec![1, -1, 0, 1]]).unwrap();
        let split = split_by_mask(&fps, &mol_list, &targets, &keys, &mask).unwrap();

        assert_eq!(split.test_targets["T1"].cids, vec!["mol0", "mol3"]);
        assert_eq!(split.train_targets["T1"].cids, vec!["mol1"]);
        assert_eq!(split.train_targets["T1"].name, "one");
        assert_eq!(split.test_targets["T1"].description, "desc");

        let mut test_mols: Vec<_> = split.test_fps.keys().cloned().collect();
        test_mols.sort();
        assert_eq!(test_mols, vec!["mol0", "mol3"]);
        let train_mols: Vec<_> = split.train_fps.keys().cloned().collect();
        assert_eq!(train_mols, vec!["mol1"]);
    }

    #[test]
    fn test_train_keeps_unmasked_positives() {
        let (fps, mol_list, targets, keys) = fixture();
        // mol1 and mol3 are not marked -1 but are still train positives
        let mask = TrainTestMask::from_rows(&[vec![1, 0, 0, 0]]).unwrap();
        let split = split_by_mask(&fps, &mol_list, &targets, &keys, &mask).unwrap();
        assert_eq!(split.train_targets["T1"].cids, vec!["mol1", "mol3"]);
        assert!(split.train_fps.is_empty());
    }

    #[test]
    fn test_molecule_in_both_sets() {
        let (fps, mol_list, mut targets, _) = fixture();
        targets.insert("T2".into(), Target::new("two", vec!["mol2".into()], ""));
        let keys = vec!["T1".to_string(), "T2".to_string()];
        let mask = TrainTestMask::from_rows(&[vec![0, 0, 1, 0], vec![0, 0, -1, 0]]).unwrap();
        let split = split_by_mask(&fps, &mol_list, &targets, &keys, &mask).unwrap();
        assert!(split.test_fps.contains_key("mol2"));
        assert!(split.train_fps.contains_key("mol2"));
        assert!(split.test_targets["T1"].cids.is_empty());
        assert_eq!(split.train_targets["T2"].cids, vec!["mol2"]);
    }

    #[test]
    fn test_split_shape_mismatch() {
        let (fps, mol_list, targets, keys) = fixture();
        let mask = TrainTestMask::from_rows(&[vec![1, -1, 0]]).unwrap();
        assert!(split_by_mask(&fps, &mol_list, &targets, &keys, &mask).is_err());

        let mask = TrainTestMask::from_rows(&[vec![1, -1, 0, 0]]).unwrap();
        let bad_keys = vec!["T9".to_string()];
        match split_by_mask(&fps, &mol_list, &targets, &bad_keys, &mask) {
            Err(DataError::UnknownTarget(k)) => assert_eq!(k, "T9"),
            other => panic!("unexpected: {:?}", other.map(|s| s.test_targets.len())),
        }
    }

    #[test]
    fn test_kfold_masks() {
        let rows = vec![0, 0, 0, 0, 0, 1, 1];
        let cols = vec![0, 1, 2, 3, 4, 1, 5];
        let assoc = BoolCsrMatrix::from_coords((2, 6), &rows, &cols).unwrap();
        let masks = kfold_masks(&assoc, 3, 42).unwrap();
        assert_eq!(masks.len(), 3);

        for i in 0..2 {
            for j in 0..6 {
                let tested = masks.iter().filter(|m| m.get(i, j) == 1).count();
                if assoc.get(i, j) {
                    assert_eq!(tested, 1);
                    assert!(masks.iter().all(|m| m.get(i, j) != 0));
                } else {
                    assert_eq!(tested, 0);
                    assert!(masks.iter().all(|m| m.get(i, j) == 0));
                }
            }
        }
        // 5 binders over 3 folds: 2, 2, 1
        let mut per_fold: Vec<usize> = masks
            .iter()
            .map(|m| m.row(0).iter().filter(|&&v| v == 1).count())
            .collect();
        per_fold.sort();
        assert_eq!(per_fold, vec![1, 2, 2]);

        assert_eq!(masks, kfold_masks(&assoc, 3, 42).unwrap());
        assert!(kfold_masks(&assoc, 1, 42).is_err());
    }
}
