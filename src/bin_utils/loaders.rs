extern crate fp_data;
extern crate serde;
extern crate serde_json;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use self::fp_data::archive;
use self::fp_data::arrays::{build_fingerprint_array, filter_targets_by_molnum, MoleculeSource};
use self::fp_data::dataset::MoleculeDataset;
use self::fp_data::folds::FoldSplit;
use self::fp_data::load::{read_scores, write_molecules, write_targets};
use self::serde::Serialize;

use super::args::DataMeta;
use crate::cv::{evaluate_fold, make_csv_basename, make_cv_filename, make_cv_subdir, FoldResult};
use crate::error::Result;

/// Extension of the fold files written by `write_fold`
pub const FOLD_EXT: &str = ".tsv.gz";

/// Loads molecules and targets, dropping small targets if asked
pub fn load_dataset(dm: &DataMeta) -> Result<MoleculeDataset> {
    info!(
        "Loading dataset from {} and {}",
        dm.molecules.display(),
        dm.targets.display()
    );
    let mut ds = MoleculeDataset::from_files(&dm.molecules, &dm.targets)?;
    if let Some(n) = dm.min_mols {
        let before = ds.targets.len();
        ds.targets = filter_targets_by_molnum(&ds.targets, n);
        info!(
            "Kept {} of {} targets with at least {} binders",
            ds.targets.len(),
            before,
            n
        );
    }
    info!("Molecules: {}", ds.mol_list.len());
    info!("Fingerprints: {}", ds.num_records());
    info!("Targets: {}", ds.targets.len());
    Ok(ds)
}

/// Builds the fingerprint array of a dataset and saves it with its row map.
/// Returns the shape and number of set bits of the saved array.
pub fn save_fingerprint_archive(
    ds: &MoleculeDataset,
    dense: bool,
    out: &Path,
) -> Result<((usize, usize), usize)> {
    let now = std::time::Instant::now();
    let (fp_arr, mol_indices) =
        build_fingerprint_array(MoleculeSource::Parsed(&ds.fingerprints), &ds.mol_list, dense)?;
    info!("Build runtime (ms): {}", now.elapsed().as_millis());

    archive::save(out, &fp_arr, &mol_indices)?;
    info!(
        "Saved {:?} fingerprint array with {} set bits to {}",
        fp_arr.shape(),
        fp_arr.nnz(),
        out.display()
    );
    Ok((fp_arr.shape(), fp_arr.nnz()))
}

/// Writes the train and test halves of fold `i` under `out_dir/i/`, named
/// after the molecules file. Returns the files written.
pub fn write_fold(
    out_dir: &Path,
    molecules_path: &Path,
    i: usize,
    split: &FoldSplit,
    mol_list: &[String],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(make_cv_subdir(out_dir, i))?;
    let basename = make_csv_basename(molecules_path);
    let file = |group_type: &str| make_cv_filename(out_dir, &basename, group_type, i, Some(FOLD_EXT));

    let paths = vec![
        file("train-targets"),
        file("train-molecules"),
        file("test-targets"),
        file("test-molecules"),
    ];
    write_targets(&paths[0], &split.train_targets)?;
    write_molecules(&paths[1], mol_list, &split.train_fps)?;
    write_targets(&paths[2], &split.test_targets)?;
    write_molecules(&paths[3], mol_list, &split.test_fps)?;
    Ok(paths)
}

/// Reads and evaluates one scores file per fold
pub fn evaluate_score_files<'a, I: IntoIterator<Item = &'a str>>(paths: I) -> Result<Vec<FoldResult>> {
    paths
        .into_iter()
        .map(|p| {
            let now = std::time::Instant::now();
            let scores = read_scores(Path::new(p))?;
            let fold = evaluate_fold(&scores)?;
            info!(
                "Evaluated {} targets from {} in {} ms",
                fold.len(),
                p,
                now.elapsed().as_millis()
            );
            Ok(fold)
        })
        .collect()
}

/// Writes `value` as pretty JSON to a file, or to stdout without one
pub fn write_json<T: Serialize>(value: &T, path: Option<&str>) -> Result<()> {
    match path {
        Some(fname) => {
            info!("Writing results to {}", fname);
            let mut f = BufWriter::new(File::create(fname)?);
            serde_json::to_writer_pretty(&mut f, value)?;
            writeln!(f)?;
            f.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
