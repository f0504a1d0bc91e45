//! Metrics
//! ---
//! ROC and precision-recall curves, their areas, logAUC and Youden's J for
//! binary labels scored by a classifier.
//!
//! Curves are computed the same way for every fold so results can be averaged:
//! one point per distinct score, highest score first.
extern crate float_ord;

use std::f64::consts::LN_10;

use self::float_ord::FloatOrd;
use thiserror::Error;

/// Default false-positive-rate cutoff for logAUC
pub const DEFAULT_MIN_FP: f64 = 0.001;

/// Why a metric could not be computed
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricError {
    /// No samples at all
    #[error("no samples")]
    Empty,
    /// Paired inputs have different lengths
    #[error("length mismatch: {0} vs {1}")]
    LengthMismatch(usize, usize),
    /// Curves are undefined when only one class is present
    #[error("only one class present ({positives} positives, {negatives} negatives)")]
    SingleClass {
        /// Number of 1 labels
        positives: usize,
        /// Number of 0 labels
        negatives: usize,
    },
    /// Labels must be 0 or 1
    #[error("invalid label {0}; labels must be 0 or 1")]
    InvalidLabel(u8),
    /// Scores must be finite
    #[error("non-finite score at index {0}")]
    NonFiniteScore(usize),
    /// Area needs x sorted one way or the other
    #[error("x is neither increasing nor decreasing")]
    NotMonotonic,
    /// Area needs at least two points
    #[error("at least 2 points are needed, got {0}")]
    TooFewPoints(usize),
    /// logAUC cutoff outside of (0, 1)
    #[error("false positive cutoff {0} must be in (0, 1)")]
    InvalidCutoff(f64),
}

/// Result alias for metric computations
pub type Result<T> = std::result::Result<T, MetricError>;

/// A curve as parallel arrays of x, y and the score thresholds producing each point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    /// x values (false positive rate or recall)
    pub x: Vec<f64>,
    /// y values (true positive rate or precision)
    pub y: Vec<f64>,
    /// Decision thresholds
    pub thresholds: Vec<f64>,
}

/// ROC and precision-recall curves with their areas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocPrc {
    /// (fpr, tpr, thresholds)
    pub roc: Curve,
    /// Area under the ROC curve
    pub auroc: f64,
    /// (recall, precision, thresholds)
    pub prc: Curve,
    /// Area under the precision-recall curve
    pub auprc: f64,
}

/// Checks labels and scores, returning the number of positives
fn check_inputs(labels: &[u8], scores: &[f64]) -> Result<usize> {
    if labels.len() != scores.len() {
        return Err(MetricError::LengthMismatch(labels.len(), scores.len()));
    }
    if labels.is_empty() {
        return Err(MetricError::Empty);
    }
    if let Some(&l) = labels.iter().find(|&&l| l > 1) {
        return Err(MetricError::InvalidLabel(l));
    }
    if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
        return Err(MetricError::NonFiniteScore(i));
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(MetricError::SingleClass {
            positives,
            negatives,
        });
    }
    Ok(positives)
}

/// Cumulative false and true positive counts at each distinct score, from the
/// highest score down, with the scores themselves as thresholds
fn binary_clf_curve(labels: &[u8], scores: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by_key(|&i| FloatOrd(-scores[i]));

    let mut fps = Vec::new();
    let mut tps = Vec::new();
    let mut thresholds = Vec::new();
    let (mut fp, mut tp) = (0usize, 0usize);
    for (k, &i) in order.iter().enumerate() {
        if labels[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_score = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_score {
            fps.push(fp as f64);
            tps.push(tp as f64);
            thresholds.push(scores[i]);
        }
    }
    (fps, tps, thresholds)
}

/// Cumulative false and true positive counts at each distinct score, highest
/// first, with the scores as thresholds
struct ClfCounts {
    fps: Vec<f64>,
    tps: Vec<f64>,
    thresholds: Vec<f64>,
}

impl ClfCounts {
    /// Checks the inputs and sorts the scores once
    fn new(labels: &[u8], scores: &[f64]) -> Result<Self> {
        check_inputs(labels, scores)?;
        let (fps, tps, thresholds) = binary_clf_curve(labels, scores);
        Ok(ClfCounts {
            fps,
            tps,
            thresholds,
        })
    }

    fn roc(&self) -> Curve {
        let (fps, tps, thresholds) = (&self.fps, &self.tps, &self.thresholds);
        let n = fps.len();
        let keep: Vec<usize> = (0..n)
            .filter(|&i| {
                i == 0
                    || i == n - 1
                    || fps[i - 1] - 2. * fps[i] + fps[i + 1] != 0.
                    || tps[i - 1] - 2. * tps[i] + tps[i + 1] != 0.
            })
            .collect();

        let fp_total = fps[n - 1];
        let tp_total = tps[n - 1];
        let mut curve = Curve {
            x: Vec::with_capacity(keep.len() + 1),
            y: Vec::with_capacity(keep.len() + 1),
            thresholds: Vec::with_capacity(keep.len() + 1),
        };
        curve.x.push(0.);
        curve.y.push(0.);
        curve.thresholds.push(thresholds[0] + 1.);
        for &i in keep.iter() {
            curve.x.push(fps[i] / fp_total);
            curve.y.push(tps[i] / tp_total);
            curve.thresholds.push(thresholds[i]);
        }
        curve
    }

    fn prc(&self) -> Curve {
        let (fps, tps, thresholds) = (&self.fps, &self.tps, &self.thresholds);
        let tp_total = tps[tps.len() - 1];
        let last_ind = tps.iter().position(|&t| t >= tp_total).unwrap_or(0);

        let mut curve = Curve {
            x: Vec::with_capacity(last_ind + 2),
            y: Vec::with_capacity(last_ind + 2),
            thresholds: Vec::with_capacity(last_ind + 1),
        };
        for i in (0..=last_ind).rev() {
            curve.x.push(tps[i] / tp_total);
            curve.y.push(tps[i] / (tps[i] + fps[i]));
            curve.thresholds.push(thresholds[i]);
        }
        curve.x.push(0.);
        curve.y.push(1.);
        curve
    }
}

/// ROC curve as (fpr, tpr, thresholds).
///
/// Points lying on a straight line between their neighbours are dropped, and
/// the curve starts at (0, 0) with a threshold one above the highest score.
pub fn roc_curve(labels: &[u8], scores: &[f64]) -> Result<Curve> {
    Ok(ClfCounts::new(labels, scores)?.roc())
}

/// Precision-recall curve as (recall, precision, thresholds).
///
/// Points run from full recall down to recall 0, stopping at the highest
/// threshold that reaches full recall. The last point (recall 0, precision 1)
/// has no threshold.
pub fn precision_recall_curve(labels: &[u8], scores: &[f64]) -> Result<Curve> {
    Ok(ClfCounts::new(labels, scores)?.prc())
}

/// Computes ROC and precision-recall curves and the area under each.
/// Scores are sorted once for both curves.
///
/// Fails rather than producing NaN when only one class is present.
pub fn compute_roc_prc(labels: &[u8], scores: &[f64]) -> Result<RocPrc> {
    let counts = ClfCounts::new(labels, scores)?;
    let roc = counts.roc();
    let auroc = get_auc(&roc.x, &roc.y, false)?;
    let prc = counts.prc();
    let auprc = get_auc(&prc.x, &prc.y, false)?;
    Ok(RocPrc {
        roc,
        auroc,
        prc,
        auprc,
    })
}

/// Trapezoidal area under (x, y). `x` may be increasing or decreasing.
/// `adjusted` subtracts 0.5, the area of a random classifier's ROC curve.
pub fn get_auc(x: &[f64], y: &[f64], adjusted: bool) -> Result<f64> {
    if x.len() != y.len() {
        return Err(MetricError::LengthMismatch(x.len(), y.len()));
    }
    if x.len() < 2 {
        return Err(MetricError::TooFewPoints(x.len()));
    }
    let direction = if x.windows(2).any(|w| w[1] < w[0]) {
        if x.windows(2).all(|w| w[1] <= w[0]) {
            -1.
        } else {
            return Err(MetricError::NotMonotonic);
        }
    } else {
        1.
    };

    let area: f64 = (1..x.len())
        .map(|i| (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.)
        .sum();
    let auc = direction * area;
    Ok(if adjusted { auc - 0.5 } else { auc })
}

/// Points of the ROC curve at or past `min_fp`, starting exactly at `min_fp`.
/// The start point takes the true positive rate just before the cutoff, as the
/// curve is a step function between thresholds.
fn truncate_roc(fpr: &[f64], tpr: &[f64], min_fp: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    if fpr.len() != tpr.len() {
        return Err(MetricError::LengthMismatch(fpr.len(), tpr.len()));
    }
    if fpr.is_empty() {
        return Err(MetricError::Empty);
    }
    if !(min_fp > 0. && min_fp < 1.) {
        return Err(MetricError::InvalidCutoff(min_fp));
    }
    let lam_index = fpr.partition_point(|&v| v < min_fp);
    let mut x = Vec::with_capacity(fpr.len() - lam_index + 1);
    let mut y = Vec::with_capacity(fpr.len() - lam_index + 1);
    if lam_index != 0 {
        x.push(min_fp);
        y.push(tpr[lam_index - 1]);
    }
    x.extend_from_slice(&fpr[lam_index..]);
    y.extend_from_slice(&tpr[lam_index..]);
    Ok((x, y))
}

/// The ROC curve from `min_fp` on, with false positive rates in log10 space
pub fn get_logroc(fpr: &[f64], tpr: &[f64], min_fp: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    let (x, y) = truncate_roc(fpr, tpr, min_fp)?;
    Ok((x.iter().map(|v| v.log10()).collect(), y))
}

/// logAUC of a random classifier, i.e. of the diagonal, for a given cutoff
pub fn random_logauc(min_fp: f64) -> f64 {
    (1. - min_fp) / (1. / min_fp).ln()
}

/// Area under the ROC curve with the false positive rate in log10 space,
/// from `min_fp` to 1, normalized so a perfect classifier scores 1.
///
/// Each segment is integrated exactly as a straight line in linear space.
/// `adjusted` subtracts the logAUC of a random classifier at the same cutoff.
///
/// Reference: Mysinger et al. J. Chem. Inf. Model. 2010, 50, 1561-1573.
pub fn get_logauc(fpr: &[f64], tpr: &[f64], min_fp: f64, adjusted: bool) -> Result<f64> {
    let (x, y) = truncate_roc(fpr, tpr, min_fp)?;
    let norm = (1. / min_fp).log10();
    let logauc: f64 = (1..x.len())
        .map(|i| {
            let dy = y[i] - y[i - 1];
            let mut intercept = y[i] - x[i] * (dy / (x[i] - x[i - 1]));
            // vertical segment
            if !intercept.is_finite() {
                intercept = 0.;
            }
            (dy / LN_10 + intercept * (x[i] / x[i - 1]).log10()) / norm
        })
        .sum();
    Ok(if adjusted {
        logauc - random_logauc(min_fp)
    } else {
        logauc
    })
}

/// Height of each ROC point above the diagonal
pub fn get_youden(fpr: &[f64], tpr: &[f64]) -> Vec<f64> {
    fpr.iter().zip(tpr.iter()).map(|(f, t)| t - f).collect()
}

/// Index of the first maximal Youden value
fn youden_argmax(fpr: &[f64], tpr: &[f64]) -> Result<(usize, f64)> {
    if fpr.len() != tpr.len() {
        return Err(MetricError::LengthMismatch(fpr.len(), tpr.len()));
    }
    get_youden(fpr, tpr)
        .into_iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, j)| match best {
            Some((_, b)) if b >= j => best,
            _ => Some((i, j)),
        })
        .ok_or(MetricError::Empty)
}

/// Youden's J statistic, max(tpr - fpr)
pub fn get_youden_index(fpr: &[f64], tpr: &[f64]) -> Result<f64> {
    youden_argmax(fpr, tpr).map(|(_, j)| j)
}

/// Youden's J statistic together with the (fpr, tpr) point reaching it
pub fn get_youden_coordinate(fpr: &[f64], tpr: &[f64]) -> Result<(f64, (f64, f64))> {
    let (i, j) = youden_argmax(fpr, tpr)?;
    Ok((j, (fpr[i], tpr[i])))
}
