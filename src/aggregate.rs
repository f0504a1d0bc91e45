//! Aggregate
//! ---
//! Combines per-target metric dictionaries across folds
extern crate hashbrown;

use std::hash::Hash;
use std::ops::Sub;

use self::hashbrown::HashMap;

use crate::metrics::{get_auc, get_logauc, Result};

/// (fpr, tpr) arrays keyed by target
pub type FpTpDict<K> = HashMap<K, (Vec<f64>, Vec<f64>)>;

/// Given dicts of (key, value), merges them into (key, [values]) in the order
/// the dicts are given. Keys missing from some dicts just get fewer values.
pub fn merge_dicts<'a, K, V, I>(dicts: I) -> HashMap<K, Vec<V>>
where
    K: 'a + Hash + Eq + Clone,
    V: 'a + Clone,
    I: IntoIterator<Item = &'a HashMap<K, V>>,
{
    let mut merged: HashMap<K, Vec<V>> = HashMap::new();
    for d in dicts {
        for (k, v) in d.iter() {
            merged.entry(k.clone()).or_insert_with(Vec::new).push(v.clone());
        }
    }
    merged
}

/// Given dicts of (key, value), returns (key, mean value)
pub fn average_dict_values<'a, K, V, I>(dicts: I) -> HashMap<K, f64>
where
    K: 'a + Hash + Eq + Clone,
    V: 'a + Copy + Into<f64>,
    I: IntoIterator<Item = &'a HashMap<K, V>>,
{
    merge_dicts(dicts)
        .into_iter()
        .map(|(k, vs)| {
            let total: f64 = vs.iter().map(|&v| v.into()).sum();
            (k, total / vs.len() as f64)
        })
        .collect()
}

/// AUC of every (fpr, tpr) curve
pub fn auc_dict_from_fp_tp_dict<K>(d: &FpTpDict<K>) -> Result<HashMap<K, f64>>
where
    K: Hash + Eq + Clone,
{
    d.iter()
        .map(|(k, (fp, tp))| Ok((k.clone(), get_auc(fp, tp, false)?)))
        .collect()
}

/// logAUC of every (fpr, tpr) curve at the given cutoff
pub fn logauc_dict_from_fp_tp_dict<K>(d: &FpTpDict<K>, min_fp: f64) -> Result<HashMap<K, f64>>
where
    K: Hash + Eq + Clone,
{
    d.iter()
        .map(|(k, (fp, tp))| Ok((k.clone(), get_logauc(fp, tp, min_fp, false)?)))
        .collect()
}

/// Subtracts the values of `d2` from those of `d1`. Only keys in both are kept.
pub fn delta_dict<K, V>(d1: &HashMap<K, V>, d2: &HashMap<K, V>) -> HashMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Copy + Sub<Output = V>,
{
    d1.iter()
        .filter_map(|(k, &v)| d2.get(k).map(|&w| (k.clone(), v - w)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricError;

    fn dicts() -> (HashMap<String, i32>, HashMap<String, i32>) {
        let d1: HashMap<String, i32> = [("a".to_string(), 1), ("b".to_string(), 2)]
            .iter()
            .cloned()
            .collect();
        let d2: HashMap<String, i32> = [("a".to_string(), 3), ("c".to_string(), 4)]
            .iter()
            .cloned()
            .collect();
        (d1, d2)
    }

    #[test]
    fn test_merge_dicts() {
        let (d1, d2) = dicts();
        let merged = merge_dicts(&[d1, d2]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["a"], vec![1, 3]);
        assert_eq!(merged["b"], vec![2]);
        assert_eq!(merged["c"], vec![4]);
    }

    #[test]
    fn test_average_dict_values() {
        let (d1, d2) = dicts();
        let avg = average_dict_values(&[d1, d2]);
        assert_eq!(avg["a"], 2.0);
        assert_eq!(avg["b"], 2.0);
        assert_eq!(avg["c"], 4.0);
    }

    #[test]
    fn test_delta_dict() {
        let (d1, d2) = dicts();
        let delta = delta_dict(&d1, &d2);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta["a"], -2);
    }

    #[test]
    fn test_auc_dicts() {
        let mut d = FpTpDict::new();
        d.insert("perfect", (vec![0., 0., 1.], vec![0., 1., 1.]));
        d.insert("diagonal", (vec![0., 1.], vec![0., 1.]));
        let aucs = auc_dict_from_fp_tp_dict(&d).unwrap();
        assert_eq!(aucs["perfect"], 1.);
        assert_eq!(aucs["diagonal"], 0.5);

        let logaucs = logauc_dict_from_fp_tp_dict(&d, 0.001).unwrap();
        assert!((logaucs["perfect"] - 1.).abs() < 1e-12);
        assert!(logaucs["diagonal"] < 0.15);

        d.insert("broken", (vec![0.], vec![0.]));
        assert_eq!(
            auc_dict_from_fp_tp_dict(&d),
            Err(MetricError::TooFewPoints(1))
        );
    }
}
