use hashbrown;

use std::collections::BTreeMap;
use std::fmt::Debug;

use self::hashbrown::HashMap;
use crate::error::{DataError, Result};

/// Ordered, duplicate-free molecule ids. Defines row and column order everywhere
pub type MolList = Vec<String>;

/// Target key -> target
pub type TargetMap = HashMap<String, Target>;

/// Molecule id -> its fingerprint records, in file order
pub type MolFingerprints = HashMap<String, Vec<FingerprintRecord>>;

/// Index in the molecule list -> row indices in a fingerprint matrix
pub type MolIndices = BTreeMap<usize, Vec<usize>>;

#[derive(Clone, Debug, PartialEq)]
/// A protein target and the molecules believed to bind it
pub struct Target {
    /// Human readable name
    pub name: String,
    /// Ids of the binding molecules
    pub cids: Vec<String>,
    /// Free text description
    pub description: String,
}

impl Target {
    /// Returns a new Target
    pub fn new(name: &str, cids: Vec<String>, description: &str) -> Self {
        Target {
            name: name.into(),
            cids,
            description: description.into(),
        }
    }
}

/// Converts one opaque fingerprint record into its set bits
pub trait NativeTuple {
    /// Total number of bits in the fingerprint
    fn bit_width(&self) -> usize;

    /// Indices of the set bits
    fn indices(&self) -> &[usize];
}

#[derive(Clone, Debug, PartialEq)]
/// One fingerprint, e.g. for a single conformer of a molecule
pub struct FingerprintRecord {
    /// Width of the fingerprint
    pub bits: usize,
    /// Set bits
    pub on_bits: Vec<usize>,
}

impl FingerprintRecord {
    /// Returns a new record. Bits are sorted and deduplicated
    pub fn new(bits: usize, mut on_bits: Vec<usize>) -> Self {
        on_bits.sort_unstable();
        on_bits.dedup();
        FingerprintRecord { bits, on_bits }
    }
}

impl NativeTuple for FingerprintRecord {
    fn bit_width(&self) -> usize {
        self.bits
    }

    fn indices(&self) -> &[usize] {
        &self.on_bits
    }
}

/// Per-target, per-molecule train/test assignment for one fold.
/// 1 = test, -1 = train, 0 = unused
#[derive(Clone, Debug, PartialEq)]
pub struct TrainTestMask {
    shape: (usize, usize),
    values: Vec<i8>,
}

impl TrainTestMask {
    /// All-zero mask
    pub fn zeros(shape: (usize, usize)) -> Self {
        TrainTestMask {
            shape,
            values: vec![0; shape.0 * shape.1],
        }
    }

    /// Builds a mask from rows, rejecting ragged rows or values outside of {-1, 0, 1}
    pub fn from_rows(rows: &[Vec<i8>]) -> Result<Self> {
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut values = Vec::with_capacity(rows.len() * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(DataError::ShapeMismatch(format!(
                    "mask row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            for (j, &v) in row.iter().enumerate() {
                if v < -1 || v > 1 {
                    return Err(DataError::InvalidMask {
                        row: i,
                        col: j,
                        value: v,
                    });
                }
            }
            values.extend_from_slice(row);
        }
        Ok(TrainTestMask {
            shape: (rows.len(), n_cols),
            values,
        })
    }

    /// (targets, molecules)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Row of target `i`
    pub fn row(&self, i: usize) -> &[i8] {
        let w = self.shape.1;
        &self.values[i * w..(i + 1) * w]
    }

    /// Value at (i, j)
    pub fn get(&self, i: usize, j: usize) -> i8 {
        self.values[i * self.shape.1 + j]
    }

    /// Sets (i, j) to -1, 0 or 1
    pub fn set(&mut self, i: usize, j: usize, v: i8) -> Result<()> {
        if i >= self.shape.0 || j >= self.shape.1 {
            return Err(DataError::ShapeMismatch(format!(
                "({}, {}) outside of {:?} mask",
                i, j, self.shape
            )));
        }
        if v < -1 || v > 1 {
            return Err(DataError::InvalidMask {
                row: i,
                col: j,
                value: v,
            });
        }
        self.values[i * self.shape.1 + j] = v;
        Ok(())
    }

    /// Whether any target row holds `value` in column `j`
    pub fn column_has(&self, j: usize, value: i8) -> bool {
        (0..self.shape.0).any(|i| self.get(i, j) == value)
    }
}

/// The trait for parsing one line of a tab separated input file
pub trait LineParse: Sync {
    /// Output type
    type Out: Debug + Send;

    /// Parses the fields of one line
    fn parse<'a, I: Iterator<Item = &'a str>>(&self, xs: I) -> std::result::Result<Self::Out, String>;
}

#[derive(Debug, Clone)]
/// `target_key  name  description  cid1,cid2,...`
pub struct TargetLine;

impl LineParse for TargetLine {
    type Out = (String, Target);

    fn parse<'a, I: Iterator<Item = &'a str>>(&self, mut xs: I) -> std::result::Result<Self::Out, String> {
        let key = xs.next().map(str::trim).filter(|k| !k.is_empty());
        let name = xs.next().map(str::trim);
        let description = xs.next().map(str::trim);
        let cids = xs.next().map(str::trim).unwrap_or("");
        match (key, name, description) {
            (Some(k), Some(n), Some(d)) => {
                let mut cids: Vec<String> = cids
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect();
                cids.sort();
                cids.dedup();
                Ok((k.into(), Target::new(n, cids, d)))
            }
            _ => Err("expected target key, name and description".into()),
        }
    }
}

#[derive(Debug, Clone)]
/// `mol_id  bit_width  idx1,idx2,...`
pub struct FingerprintLine;

impl LineParse for FingerprintLine {
    type Out = (String, FingerprintRecord);

    fn parse<'a, I: Iterator<Item = &'a str>>(&self, mut xs: I) -> std::result::Result<Self::Out, String> {
        let mol = xs
            .next()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or("missing molecule id")?;
        let bits: usize = xs
            .next()
            .ok_or("missing bit width")?
            .trim()
            .parse()
            .map_err(|e| format!("bad bit width: {}", e))?;
        let on_bits = xs
            .next()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<usize>().map_err(|e| format!("bad bit index `{}`: {}", s, e)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((mol.into(), FingerprintRecord::new(bits, on_bits)))
    }
}

#[derive(Debug, Clone)]
/// `target_key  label  score`, label being 0 or 1
pub struct ScoreLine;

impl LineParse for ScoreLine {
    type Out = (String, u8, f64);

    fn parse<'a, I: Iterator<Item = &'a str>>(&self, mut xs: I) -> std::result::Result<Self::Out, String> {
        let key = xs
            .next()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or("missing target key")?;
        let label: u8 = xs
            .next()
            .ok_or("missing label")?
            .trim()
            .parse()
            .map_err(|e| format!("bad label: {}", e))?;
        let score: f64 = xs
            .next()
            .ok_or("missing score")?
            .trim()
            .parse()
            .map_err(|e| format!("bad score: {}", e))?;
        Ok((key.into(), label, score))
    }
}
