//! Archive
//! ---
//!
//! Saves and loads a fingerprint matrix with its molecule row map as a
//! single file. Only set positions are stored; values are implied true.
use bincode;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::dataset::types::MolIndices;
use crate::datatypes::{BoolCsrMatrix, FingerprintArray};
use crate::error::{DataError, Result};

/// Element type of the stored matrix values
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum ElementType {
    /// Boolean values
    Bool,
}

/// On-disk layout. Field names mirror the stored compressed-row parts
#[derive(Serialize, Deserialize, Debug)]
struct FingerprintArchive {
    dtype: ElementType,
    indices: Vec<usize>,
    indptr: Vec<usize>,
    shape: (usize, usize),
    ndata: usize,
    mol_indices: MolIndices,
}

/// Number of matrix rows a row map points at
fn mapped_rows(mol_indices: &MolIndices) -> usize {
    mol_indices.values().map(|v| v.len()).sum()
}

/// Writes the matrix and row map to `path`. Dense matrices are stored in
/// compressed-row form. The row map must cover every row, as `load` requires.
pub fn save(path: &Path, arr: &FingerprintArray, mol_indices: &MolIndices) -> Result<()> {
    let rows = arr.shape().0;
    let mapped = mapped_rows(mol_indices);
    if mapped != rows {
        return Err(DataError::InvalidInput(format!(
            "molecule map covers {} rows of {}",
            mapped, rows
        )));
    }
    let (shape, indptr, indices) = arr.to_csr().into_raw_parts();
    let archive = FingerprintArchive {
        dtype: ElementType::Bool,
        ndata: indices.len(),
        indices,
        indptr,
        shape,
        mol_indices: mol_indices.clone(),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, &archive)?;
    writer.flush()?;
    debug!(
        "Saved {:?} array with {} set bits to {}",
        archive.shape,
        archive.ndata,
        path.display()
    );
    Ok(())
}

/// Reads back what `save` wrote, as a dense matrix if asked
pub fn load(path: &Path, dense: bool) -> Result<(FingerprintArray, MolIndices)> {
    let archive: FingerprintArchive = {
        let reader = BufReader::new(File::open(path)?);
        bincode::deserialize_from(reader)?
    };
    if archive.ndata != archive.indices.len() {
        return Err(DataError::CorruptArchive(format!(
            "ndata is {} but {} indices are stored",
            archive.ndata,
            archive.indices.len()
        )));
    }
    let rows = archive.shape.0;
    let mapped = mapped_rows(&archive.mol_indices);
    if mapped != rows {
        return Err(DataError::CorruptArchive(format!(
            "molecule map covers {} rows of {}",
            mapped, rows
        )));
    }

    let csr = BoolCsrMatrix::from_raw_parts(archive.shape, archive.indptr, archive.indices)
        .map_err(|e| DataError::CorruptArchive(e.to_string()))?;
    let arr = if dense {
        FingerprintArray::Dense(csr.to_dense())
    } else {
        FingerprintArray::Sparse(csr)
    };
    Ok((arr, archive.mol_indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture() -> (FingerprintArray, MolIndices) {
        let rows = vec![0, 0, 1, 2, 2, 2];
        let cols = vec![1, 1023, 5, 0, 2, 4];
        let csr = BoolCsrMatrix::from_coords((3, 1024), &rows, &cols).unwrap();
        let mut mol_indices = MolIndices::new();
        mol_indices.insert(0, vec![0, 1]);
        mol_indices.insert(1, vec![2]);
        (FingerprintArray::Sparse(csr), mol_indices)
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("fps.bin");
        let (arr, mol_indices) = fixture();
        save(&path, &arr, &mol_indices).expect("save");

        let (loaded, loaded_indices) = load(&path, false).expect("load");
        assert_eq!(loaded, arr);
        assert_eq!(loaded_indices, mol_indices);

        let (dense, _) = load(&path, true).expect("load dense");
        assert_eq!(dense, FingerprintArray::Dense(arr.to_dense()));
    }

    #[test]
    fn test_round_trip_dense_input() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("fps.bin");
        let (arr, mol_indices) = fixture();
        let dense = FingerprintArray::Dense(arr.to_dense());
        save(&path, &dense, &mol_indices).expect("save");
        let (loaded, _) = load(&path, false).expect("load");
        assert_eq!(loaded, arr);
    }

    #[test]
    fn test_empty_matrix() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("empty.bin");
        let arr = FingerprintArray::Sparse(BoolCsrMatrix::empty((0, 16)));
        save(&path, &arr, &MolIndices::new()).expect("save");
        let (loaded, mol_indices) = load(&path, false).expect("load");
        assert_eq!(loaded.shape(), (0, 16));
        assert!(mol_indices.is_empty());
    }

    #[test]
    fn test_partial_row_map_rejected_on_save() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("fps.bin");
        let (arr, mut mol_indices) = fixture();
        match save(&path, &arr, &MolIndices::new()) {
            Err(DataError::InvalidInput(_)) => (),
            other => panic!("unexpected: {:?}", other),
        }
        mol_indices.remove(&1);
        assert!(save(&path, &arr, &mol_indices).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("junk.bin");
        std::fs::write(&path, b"not an archive").unwrap();
        assert!(load(&path, false).is_err());
        assert!(load(&dir.path().join("missing.bin"), false).is_err());
    }
}
