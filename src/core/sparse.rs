/// Row-major compressed sparse matrix (CSR) of `f64` features.
///
/// Column indices within a row are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// An empty matrix with `n_cols` columns and no rows.
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            indptr: vec![0],
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from rows of `(column, value)` pairs. Rows are sorted and
    /// duplicate columns summed; explicit zeros are dropped.
    pub fn from_rows(rows: Vec<Vec<(usize, f64)>>, n_cols: usize) -> Self {
        let mut m = Self::new(n_cols);
        for row in rows {
            m.push_row(row);
        }
        m
    }

    /// Append one row.
    pub fn push_row(&mut self, mut row: Vec<(usize, f64)>) {
        row.sort_unstable_by_key(|&(c, _)| c);
        let mut last: Option<usize> = None;
        for (c, v) in row {
            debug_assert!(c < self.n_cols, "column {c} out of range {}", self.n_cols);
            if last == Some(c) {
                if let Some(prev) = self.values.last_mut() {
                    *prev += v;
                }
                continue;
            }
            self.indices.push(c);
            self.values.push(v);
            last = Some(c);
        }
        // Drop zeros introduced by the input or by summation.
        let start = *self.indptr.last().unwrap_or(&0);
        let mut write = start;
        for read in start..self.indices.len() {
            if self.values[read] != 0.0 {
                self.indices[write] = self.indices[read];
                self.values[write] = self.values[read];
                write += 1;
            }
        }
        self.indices.truncate(write);
        self.values.truncate(write);
        self.indptr.push(write);
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let (s, e) = (self.indptr[i], self.indptr[i + 1]);
        (&self.indices[s..e], &self.values[s..e])
    }

    /// Dot product of rows `i` and `j` via a sorted merge.
    pub fn row_dot(&self, i: usize, j: usize) -> f64 {
        let (ia, va) = self.row(i);
        let (ib, vb) = self.row(j);
        let (mut a, mut b) = (0, 0);
        let mut acc = 0.0;
        while a < ia.len() && b < ib.len() {
            match ia[a].cmp(&ib[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    acc += va[a] * vb[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        acc
    }

    /// Dense `n_rows x n_rows` Gram matrix `X X^T`, row-major.
    pub fn gram(&self) -> Vec<f64> {
        let n = self.n_rows();
        let mut k = vec![0.0; n * n];
        for i in 0..n {
            for j in i..n {
                let d = self.row_dot(i, j);
                k[i * n + j] = d;
                k[j * n + i] = d;
            }
        }
        k
    }

    /// Column means over all rows.
    pub fn column_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.n_cols];
        let n = self.n_rows();
        if n == 0 {
            return means;
        }
        for (&c, &v) in self.indices.iter().zip(&self.values) {
            means[c] += v;
        }
        let inv = 1.0 / n as f64;
        for m in &mut means {
            *m *= inv;
        }
        means
    }

    /// Dense row `i` dotted with a row-major `n_cols x n_out` weight matrix.
    pub fn row_times_dense(&self, i: usize, weights: &[f64], n_out: usize, out: &mut [f64]) {
        debug_assert_eq!(weights.len(), self.n_cols * n_out);
        let (idx, vals) = self.row(i);
        for (&c, &v) in idx.iter().zip(vals) {
            let w = &weights[c * n_out..(c + 1) * n_out];
            for (o, wk) in out.iter_mut().zip(w) {
                *o += v * wk;
            }
        }
    }

    /// `X^T D` for a dense row-major `n_rows x n_out` matrix `D`, as a row-major
    /// `n_cols x n_out` matrix.
    pub fn transpose_times_dense(&self, dense: &[f64], n_out: usize) -> Vec<f64> {
        debug_assert_eq!(dense.len(), self.n_rows() * n_out);
        let mut out = vec![0.0; self.n_cols * n_out];
        for i in 0..self.n_rows() {
            let d = &dense[i * n_out..(i + 1) * n_out];
            let (idx, vals) = self.row(i);
            for (&c, &v) in idx.iter().zip(vals) {
                let o = &mut out[c * n_out..(c + 1) * n_out];
                for (ok, dk) in o.iter_mut().zip(d) {
                    *ok += v * dk;
                }
            }
        }
        out
    }
}
