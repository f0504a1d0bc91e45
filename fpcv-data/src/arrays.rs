//! Arrays
//! ---
//!
//! Converts targets and fingerprint records into boolean matrices whose
//! column (or row) order follows a molecule list
use hashbrown;

use std::borrow::Cow;
use std::path::PathBuf;

use self::hashbrown::{HashMap, HashSet};

use crate::dataset::types::{MolFingerprints, MolIndices, NativeTuple, TargetMap};
use crate::datatypes::{BoolCsrMatrix, DenseBoolMatrix, FingerprintArray};
use crate::error::{DataError, Result};
use crate::load::{read_molecules, read_targets};

/// Where targets come from
#[derive(Debug)]
pub enum TargetSource<'a> {
    /// Already parsed
    Parsed(&'a TargetMap),
    /// A targets file still to be read
    File(PathBuf),
}

/// Where fingerprints come from
#[derive(Debug)]
pub enum MoleculeSource<'a> {
    /// Already parsed
    Parsed(&'a MolFingerprints),
    /// A molecules file still to be read
    File(PathBuf),
}

impl<'a> TargetSource<'a> {
    fn resolve(self) -> Result<Cow<'a, TargetMap>> {
        match self {
            TargetSource::Parsed(t) => Ok(Cow::Borrowed(t)),
            TargetSource::File(path) => Ok(Cow::Owned(read_targets(&path)?)),
        }
    }
}

impl<'a> MoleculeSource<'a> {
    fn resolve(self) -> Result<Cow<'a, MolFingerprints>> {
        match self {
            MoleculeSource::Parsed(m) => Ok(Cow::Borrowed(m)),
            MoleculeSource::File(path) => Ok(Cow::Owned(read_molecules(&path)?.1)),
        }
    }
}

/// Builds the target x molecule association matrix.
///
/// Rows follow the sorted target keys, which are returned alongside; columns
/// follow `mol_list`. Every molecule a target references must be in `mol_list`.
pub fn build_target_array(
    targets: TargetSource,
    mol_list: &[String],
) -> Result<(BoolCsrMatrix, Vec<String>)> {
    let targets = targets.resolve()?;
    let mut target_list: Vec<String> = targets.keys().cloned().collect();
    target_list.sort();

    let mol_inds: HashMap<&str, usize> = mol_list
        .iter()
        .enumerate()
        .map(|(i, m)| (m.as_str(), i))
        .collect();

    let num_pairs = targets.values().map(|t| t.cids.len()).sum();
    let mut rows = Vec::with_capacity(num_pairs);
    let mut cols = Vec::with_capacity(num_pairs);
    for (i, key) in target_list.iter().enumerate() {
        for cid in targets[key].cids.iter() {
            let j = mol_inds
                .get(cid.as_str())
                .ok_or_else(|| DataError::UnknownMolecule {
                    target: key.clone(),
                    molecule: cid.clone(),
                })?;
            rows.push(i);
            cols.push(*j);
        }
    }

    let arr = BoolCsrMatrix::from_coords((target_list.len(), mol_list.len()), &rows, &cols)?;
    debug!(
        "Built {}x{} target array with {} associations",
        target_list.len(),
        mol_list.len(),
        arr.nnz()
    );
    Ok((arr, target_list))
}

/// Builds the fingerprint matrix, one row per fingerprint record.
///
/// The molecules must be exactly those of `mol_list`. Rows are laid out
/// molecule by molecule in list order, and the returned map gives the rows of
/// each molecule by its list index. Width comes from the first molecule's
/// first record.
pub fn build_fingerprint_array(
    molecules: MoleculeSource,
    mol_list: &[String],
    dense: bool,
) -> Result<(FingerprintArray, MolIndices)> {
    let molecules = molecules.resolve()?;
    check_same_molecules(&molecules, mol_list)?;

    let bit_num = match mol_list.first() {
        Some(m) => molecules[m]
            .first()
            .map(|r| r.bit_width())
            .ok_or_else(|| {
                DataError::InvalidInput(format!(
                    "first molecule `{}` has no fingerprint records",
                    m
                ))
            })?,
        None => 0,
    };

    let num_rows: usize = mol_list.iter().map(|m| molecules[m].len()).sum();
    let num_bits: usize = mol_list
        .iter()
        .flat_map(|m| molecules[m].iter())
        .map(|r| r.indices().len())
        .sum();

    let mut mol_indices = MolIndices::new();
    let mut all_row_inds = Vec::with_capacity(num_bits);
    let mut all_col_inds = Vec::with_capacity(num_bits);
    let mut max_ind = 0;
    for (k, mol_name) in mol_list.iter().enumerate() {
        let records = &molecules[mol_name];
        mol_indices.insert(k, (max_ind..max_ind + records.len()).collect());
        for (row, record) in (max_ind..).zip(records.iter()) {
            for &bit in record.indices() {
                if bit >= bit_num {
                    return Err(DataError::BitOutOfRange {
                        molecule: mol_name.clone(),
                        bit,
                        width: bit_num,
                    });
                }
                all_row_inds.push(row);
                all_col_inds.push(bit);
            }
        }
        max_ind += records.len();
    }

    let shape = (num_rows, bit_num);
    let arr = if dense {
        let mut all_fps = DenseBoolMatrix::new(shape);
        for (&i, &j) in all_row_inds.iter().zip(all_col_inds.iter()) {
            all_fps.set(i, j, true);
        }
        FingerprintArray::Dense(all_fps)
    } else {
        FingerprintArray::Sparse(BoolCsrMatrix::from_coords(
            shape,
            &all_row_inds,
            &all_col_inds,
        )?)
    };
    debug!(
        "Built {}x{} fingerprint array for {} molecules",
        num_rows,
        bit_num,
        mol_list.len()
    );
    Ok((arr, mol_indices))
}

/// Fails unless the fingerprint molecules and the list hold the same ids
fn check_same_molecules(molecules: &MolFingerprints, mol_list: &[String]) -> Result<()> {
    let listed: HashSet<&str> = mol_list.iter().map(String::as_str).collect();
    if listed.len() != mol_list.len() {
        return Err(DataError::InvalidInput(
            "molecule list contains duplicates".into(),
        ));
    }
    let missing = listed
        .iter()
        .filter(|m| !molecules.contains_key(**m))
        .count();
    let extra = molecules
        .keys()
        .filter(|m| !listed.contains(m.as_str()))
        .count();
    if missing > 0 || extra > 0 {
        return Err(DataError::MoleculeSetMismatch { missing, extra });
    }
    Ok(())
}

/// Returns the targets that have at least `n` binders
pub fn filter_targets_by_molnum(targets: &TargetMap, n: usize) -> TargetMap {
    targets
        .iter()
        .filter(|(_, t)| t.cids.len() >= n)
        .map(|(k, t)| (k.clone(), t.clone()))
        .collect()
}
