use crate::error::{DataError, Result};

/// Boolean sparse matrix in compressed-row form. Only the positions of the
/// set entries are stored.
#[derive(Clone, Debug, PartialEq)]
pub struct BoolCsrMatrix {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
}

/// Row-major dense boolean matrix
#[derive(Clone, Debug, PartialEq)]
pub struct DenseBoolMatrix {
    shape: (usize, usize),
    data: Vec<bool>,
}

/// A fingerprint matrix in either representation
#[derive(Clone, Debug, PartialEq)]
pub enum FingerprintArray {
    /// Compressed-row storage
    Sparse(BoolCsrMatrix),
    /// Dense storage
    Dense(DenseBoolMatrix),
}

impl BoolCsrMatrix {
    /// Matrix of the given shape with nothing set
    pub fn empty(shape: (usize, usize)) -> Self {
        BoolCsrMatrix {
            shape,
            indptr: vec![0; shape.0 + 1],
            indices: Vec::new(),
        }
    }

    /// Builds the matrix in one pass from complete coordinate lists.
    /// Coordinates may come in any order and may repeat.
    pub fn from_coords(shape: (usize, usize), rows: &[usize], cols: &[usize]) -> Result<Self> {
        let (n_rows, n_cols) = shape;
        if rows.len() != cols.len() {
            return Err(DataError::ShapeMismatch(format!(
                "{} row coordinates but {} column coordinates",
                rows.len(),
                cols.len()
            )));
        }
        if let Some((&r, &c)) = rows
            .iter()
            .zip(cols.iter())
            .find(|&(&r, &c)| r >= n_rows || c >= n_cols)
        {
            return Err(DataError::ShapeMismatch(format!(
                "coordinate ({}, {}) outside of {}x{} matrix",
                r, c, n_rows, n_cols
            )));
        }

        // Counting pass, then prefix sums give row offsets
        let mut indptr = vec![0usize; n_rows + 1];
        for &r in rows {
            indptr[r + 1] += 1;
        }
        for i in 0..n_rows {
            indptr[i + 1] += indptr[i];
        }

        let mut next = indptr.clone();
        let mut indices = vec![0usize; rows.len()];
        for (&r, &c) in rows.iter().zip(cols.iter()) {
            indices[next[r]] = c;
            next[r] += 1;
        }

        // Sort each row and compact away repeated coordinates
        let mut write = 0;
        let mut start = 0;
        for i in 0..n_rows {
            let end = indptr[i + 1];
            indices[start..end].sort_unstable();
            let row_start = write;
            for k in start..end {
                let c = indices[k];
                if write == row_start || indices[write - 1] != c {
                    indices[write] = c;
                    write += 1;
                }
            }
            start = end;
            indptr[i + 1] = write;
        }
        indices.truncate(write);
        indices.shrink_to_fit();

        Ok(BoolCsrMatrix {
            shape,
            indptr,
            indices,
        })
    }

    /// Rebuilds a matrix from its stored parts, checking every CSR invariant
    pub fn from_raw_parts(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
    ) -> Result<Self> {
        let (n_rows, n_cols) = shape;
        if indptr.len() != n_rows + 1 {
            return Err(DataError::ShapeMismatch(format!(
                "indptr has {} entries, expected {}",
                indptr.len(),
                n_rows + 1
            )));
        }
        if indptr[0] != 0 || indptr[n_rows] != indices.len() {
            return Err(DataError::ShapeMismatch(
                "indptr does not span the index array".into(),
            ));
        }
        for i in 0..n_rows {
            if indptr[i] > indptr[i + 1] || indptr[i + 1] > indices.len() {
                return Err(DataError::ShapeMismatch(format!(
                    "indptr decreases or overruns at row {}",
                    i
                )));
            }
            let row = &indices[indptr[i]..indptr[i + 1]];
            if row.windows(2).any(|w| w[0] >= w[1]) {
                return Err(DataError::ShapeMismatch(format!(
                    "column indices of row {} are not strictly increasing",
                    i
                )));
            }
            if row.last().map_or(false, |&c| c >= n_cols) {
                return Err(DataError::ShapeMismatch(format!(
                    "row {} has a column index past {}",
                    i, n_cols
                )));
            }
        }
        Ok(BoolCsrMatrix {
            shape,
            indptr,
            indices,
        })
    }

    /// Converts a dense matrix
    pub fn from_dense(dense: &DenseBoolMatrix) -> Self {
        let (n_rows, n_cols) = dense.shape;
        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::new();
        indptr.push(0);
        for i in 0..n_rows {
            indices.extend(
                dense.row(i)
                    .iter()
                    .enumerate()
                    .filter(|&(_, &v)| v)
                    .map(|(j, _)| j),
            );
            indptr.push(indices.len());
        }
        BoolCsrMatrix {
            shape: (n_rows, n_cols),
            indptr,
            indices,
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of set entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Row boundary offsets, length rows + 1
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// Column indices of all set entries, row by row
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Sorted column indices set in row `i`
    pub fn row(&self, i: usize) -> &[usize] {
        &self.indices[self.indptr[i]..self.indptr[i + 1]]
    }

    /// Whether (i, j) is set
    pub fn get(&self, i: usize, j: usize) -> bool {
        i < self.shape.0 && self.row(i).binary_search(&j).is_ok()
    }

    /// Expands to a dense matrix
    pub fn to_dense(&self) -> DenseBoolMatrix {
        let mut dense = DenseBoolMatrix::new(self.shape);
        for i in 0..self.shape.0 {
            for &j in self.row(i) {
                dense.set(i, j, true);
            }
        }
        dense
    }

    /// Gives back (shape, indptr, indices)
    pub fn into_raw_parts(self) -> ((usize, usize), Vec<usize>, Vec<usize>) {
        (self.shape, self.indptr, self.indices)
    }
}

impl DenseBoolMatrix {
    /// All-false matrix
    pub fn new(shape: (usize, usize)) -> Self {
        DenseBoolMatrix {
            shape,
            data: vec![false; shape.0 * shape.1],
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Row `i` as a slice
    pub fn row(&self, i: usize) -> &[bool] {
        let w = self.shape.1;
        &self.data[i * w..(i + 1) * w]
    }

    /// Value at (i, j)
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.data[i * self.shape.1 + j]
    }

    /// Sets (i, j)
    pub fn set(&mut self, i: usize, j: usize, v: bool) {
        self.data[i * self.shape.1 + j] = v;
    }

    /// Number of set entries
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

impl FingerprintArray {
    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        match self {
            FingerprintArray::Sparse(m) => m.shape(),
            FingerprintArray::Dense(m) => m.shape(),
        }
    }

    /// Number of set bits over all rows
    pub fn nnz(&self) -> usize {
        match self {
            FingerprintArray::Sparse(m) => m.nnz(),
            FingerprintArray::Dense(m) => m.count_set(),
        }
    }

    /// Compressed-row view, converting if needed
    pub fn to_csr(&self) -> BoolCsrMatrix {
        match self {
            FingerprintArray::Sparse(m) => m.clone(),
            FingerprintArray::Dense(m) => BoolCsrMatrix::from_dense(m),
        }
    }

    /// Dense view, converting if needed
    pub fn to_dense(&self) -> DenseBoolMatrix {
        match self {
            FingerprintArray::Sparse(m) => m.to_dense(),
            FingerprintArray::Dense(m) => m.clone(),
        }
    }
}

#[cfg(test)]
mod test_datatypes {
    use super::*;

    #[test]
    fn test_from_coords() {
        let rows = vec![2, 0, 0, 2, 0, 2];
        let cols = vec![3, 4, 1, 0, 1, 3];
        let m = BoolCsrMatrix::from_coords((3, 5), &rows, &cols).expect("valid coords");
        assert_eq!(m.shape(), (3, 5));
        assert_eq!(m.indptr(), &[0, 2, 2, 4]);
        assert_eq!(m.indices(), &[1, 4, 0, 3]);
        assert_eq!(m.row(1), &[] as &[usize]);
        assert!(m.get(2, 3));
        assert!(!m.get(1, 3));
        assert!(!m.get(7, 0));
    }

    #[test]
    fn test_from_coords_out_of_range() {
        assert!(BoolCsrMatrix::from_coords((2, 2), &[0, 2], &[0, 0]).is_err());
        assert!(BoolCsrMatrix::from_coords((2, 2), &[0], &[0, 1]).is_err());
    }

    #[test]
    fn test_dense_conversion() {
        let m = BoolCsrMatrix::from_coords((2, 3), &[0, 1, 1], &[2, 0, 1]).unwrap();
        let d = m.to_dense();
        assert_eq!(d.row(0), &[false, false, true]);
        assert_eq!(d.row(1), &[true, true, false]);
        assert_eq!(d.count_set(), 3);
        assert_eq!(BoolCsrMatrix::from_dense(&d), m);
    }

    #[test]
    fn test_from_raw_parts() {
        assert!(BoolCsrMatrix::from_raw_parts((2, 3), vec![0, 1, 2], vec![2, 0]).is_ok());
        // wrong indptr length
        assert!(BoolCsrMatrix::from_raw_parts((2, 3), vec![0, 2], vec![2, 0]).is_err());
        // unsorted row
        assert!(BoolCsrMatrix::from_raw_parts((1, 3), vec![0, 2], vec![2, 0]).is_err());
        // column past width
        assert!(BoolCsrMatrix::from_raw_parts((1, 3), vec![0, 1], vec![3]).is_err());
        // indptr does not cover indices
        assert!(BoolCsrMatrix::from_raw_parts((1, 3), vec![0, 1], vec![0, 1]).is_err());
    }
}
