//! Cross-validation
//! ---
//!
//! Per-fold evaluation of scored targets, summaries across folds, and the
//! file layout of fold outputs
extern crate fp_data;
extern crate hashbrown;
extern crate rayon;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use self::fp_data::load::ScoreTable;
use self::hashbrown::HashMap;
use self::rayon::prelude::*;

use crate::aggregate::{
    auc_dict_from_fp_tp_dict, average_dict_values, logauc_dict_from_fp_tp_dict, FpTpDict,
};
use crate::error::{CvError, Result};
use crate::metrics::{compute_roc_prc, get_youden_index, RocPrc};

/// Extension of fold output files unless another is given
pub const DEFAULT_OUT_EXT: &str = ".csv.gz";

/// Directory holding the outputs of fold `i`
pub fn make_cv_subdir(basedir: &Path, i: usize) -> PathBuf {
    basedir.join(i.to_string())
}

/// Path of an output file for fold `i`: `out_dir/i/{basename}_{group_type}_{i}{ext}`
pub fn make_cv_filename(
    out_dir: &Path,
    basename: &str,
    group_type: &str,
    i: usize,
    ext: Option<&str>,
) -> PathBuf {
    let ext = ext.unwrap_or(DEFAULT_OUT_EXT);
    make_cv_subdir(out_dir, i).join(format!("{}_{}_{}{}", basename, group_type, i, ext))
}

/// File name of `path` without its last extension and without a trailing `.csv`
pub fn make_csv_basename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.rfind(".csv") {
        Some(i) if i + 4 == stem.len() => stem[..i].to_string(),
        _ => stem,
    }
}

/// Curves and areas of every target in one fold, keyed by target
pub type FoldResult = BTreeMap<String, RocPrc>;

/// Computes ROC and precision-recall results for every target of a fold.
///
/// Targets are evaluated in parallel. A target whose labels hold a single
/// class fails the whole fold.
pub fn evaluate_fold(scores: &ScoreTable) -> Result<FoldResult> {
    let now = std::time::Instant::now();
    let results: Vec<(String, RocPrc)> = scores
        .par_iter()
        .map(|(key, (labels, values))| {
            compute_roc_prc(labels, values)
                .map(|res| (key.clone(), res))
                .map_err(|source| CvError::Target {
                    target: key.clone(),
                    source,
                })
        })
        .collect::<Result<_>>()?;
    debug!(
        "Evaluated {} targets in {} ms",
        results.len(),
        now.elapsed().as_millis()
    );
    Ok(results.into_iter().collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Mean metrics of one target across the folds it appears in
pub struct TargetSummary {
    /// Number of folds the target was evaluated in
    pub folds: usize,
    /// Mean area under the ROC curve
    pub auroc: f64,
    /// Mean area under the precision-recall curve
    pub auprc: f64,
    /// Mean logAUC
    pub logauc: f64,
    /// Mean Youden index
    pub youden: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Summary of a cross-validation run
pub struct CvSummary {
    /// Number of folds summarized
    pub folds: usize,
    /// False positive cutoff used for logAUC
    pub min_fp: f64,
    /// Per-target means
    pub targets: BTreeMap<String, TargetSummary>,
    /// Mean AUROC over targets
    pub mean_auroc: f64,
    /// Mean AUPRC over targets
    pub mean_auprc: f64,
    /// Mean logAUC over targets
    pub mean_logauc: f64,
}

fn mean<'a, I: Iterator<Item = &'a f64>>(values: I) -> f64 {
    let (total, n) = values.fold((0., 0usize), |(t, n), v| (t + v, n + 1));
    if n == 0 {
        0.
    } else {
        total / n as f64
    }
}

/// Averages per-target metrics over folds.
///
/// AUROC and logAUC are recomputed from each fold's ROC curve; AUPRC is taken
/// as computed for the fold.
pub fn summarize_folds(folds: &[FoldResult], min_fp: f64) -> Result<CvSummary> {
    let mut aurocs = Vec::with_capacity(folds.len());
    let mut auprcs = Vec::with_capacity(folds.len());
    let mut logaucs = Vec::with_capacity(folds.len());
    let mut youdens = Vec::with_capacity(folds.len());
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for fold in folds.iter() {
        let fp_tp: FpTpDict<&str> = fold
            .iter()
            .map(|(k, res)| (k.as_str(), (res.roc.x.clone(), res.roc.y.clone())))
            .collect();
        aurocs.push(auc_dict_from_fp_tp_dict(&fp_tp)?);
        logaucs.push(logauc_dict_from_fp_tp_dict(&fp_tp, min_fp)?);
        auprcs.push(
            fold.iter()
                .map(|(k, res)| (k.as_str(), res.auprc))
                .collect::<HashMap<&str, f64>>(),
        );
        youdens.push(
            fold.iter()
                .map(|(k, res)| Ok((k.as_str(), get_youden_index(&res.roc.x, &res.roc.y)?)))
                .collect::<Result<HashMap<&str, f64>>>()?,
        );
        for k in fold.keys() {
            *counts.entry(k.as_str()).or_insert(0) += 1;
        }
    }

    let auroc = average_dict_values(&aurocs);
    let auprc = average_dict_values(&auprcs);
    let logauc = average_dict_values(&logaucs);
    let youden = average_dict_values(&youdens);

    let targets: BTreeMap<String, TargetSummary> = counts
        .iter()
        .map(|(&k, &n)| {
            (
                k.to_string(),
                TargetSummary {
                    folds: n,
                    auroc: auroc[k],
                    auprc: auprc[k],
                    logauc: logauc[k],
                    youden: youden[k],
                },
            )
        })
        .collect();

    info!("Summarized {} targets over {} folds", targets.len(), folds.len());
    Ok(CvSummary {
        folds: folds.len(),
        min_fp,
        mean_auroc: mean(targets.values().map(|t| &t.auroc)),
        mean_auprc: mean(targets.values().map(|t| &t.auprc)),
        mean_logauc: mean(targets.values().map(|t| &t.logauc)),
        targets,
    })
}
