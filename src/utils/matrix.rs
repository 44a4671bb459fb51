//! Dense row-major matrix storage and GEMM
//!
//! `Matrix` stores `rows × cols` f64 values contiguously in row-major order, the
//! layout expected by `gemm` (and by CBLAS when the `blas` feature is enabled).
//! Sample matrices keep one example per row; weight matrices keep one class per
//! column.

use crate::error::{ClassifierError, Result};

/// Dense row-major matrix of f64 values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a `rows × cols` matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap a row-major buffer.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(ClassifierError::dimension(rows * cols, data.len()));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from equally sized rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(ClassifierError::dimension(cols, row.len()));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Copy of column `col`.
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    /// Overwrite column `col` with `values`.
    pub fn set_column(&mut self, col: usize, values: &[f64]) -> Result<()> {
        if values.len() != self.rows {
            return Err(ClassifierError::dimension(self.rows, values.len()));
        }
        for (r, &value) in values.iter().enumerate() {
            self.set(r, col, value);
        }
        Ok(())
    }

    /// Return a copy with a constant-1 column prepended (index 0 is the bias).
    pub fn with_bias_column(&self) -> Matrix {
        let cols = self.cols + 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for r in 0..self.rows {
            data.push(1.0);
            data.extend_from_slice(self.row(r));
        }
        Matrix {
            rows: self.rows,
            cols,
            data,
        }
    }

    /// Keep only the listed columns, in the order given.
    pub fn select_columns(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(self.rows * indices.len());
        for r in 0..self.rows {
            let row = self.row(r);
            data.extend(indices.iter().map(|&c| row[c]));
        }
        Matrix {
            rows: self.rows,
            cols: indices.len(),
            data,
        }
    }

    /// Gather the listed rows, in the order given.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &r in indices {
            data.extend_from_slice(self.row(r));
        }
        Matrix {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    /// Population standard deviation of every column (divides by N).
    pub fn column_std(&self) -> Vec<f64> {
        if self.rows == 0 || self.cols == 0 {
            return vec![0.0; self.cols];
        }
        let n = self.rows as f64;
        let mut mean = vec![0.0; self.cols];
        for row in self.data.chunks_exact(self.cols) {
            for (m, &v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }

        let mut var = vec![0.0; self.cols];
        for row in self.data.chunks_exact(self.cols) {
            for ((acc, &v), &m) in var.iter_mut().zip(row).zip(&mean) {
                let d = v - m;
                *acc += d * d;
            }
        }
        var.into_iter().map(|v| (v / n).sqrt()).collect()
    }

    /// Variance over every stored value.
    pub fn variance(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let n = self.data.len() as f64;
        let mean = self.data.iter().sum::<f64>() / n;
        self.data.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
    }

    /// Multiply every value by `factor`.
    pub fn scale_inplace(&mut self, factor: f64) {
        for value in self.data.iter_mut() {
            *value *= factor;
        }
    }

    /// Squared Euclidean norm of every row.
    pub fn row_norms_squared(&self) -> Vec<f64> {
        (0..self.rows)
            .map(|r| self.row(r).iter().map(|v| v * v).sum())
            .collect()
    }

    /// `out = self · other`, reusing `out`'s buffer.
    pub fn matmul_into(&self, other: &Matrix, out: &mut Matrix) -> Result<()> {
        if self.cols != other.rows {
            return Err(ClassifierError::dimension(self.cols, other.rows));
        }
        if out.shape() != (self.rows, other.cols) {
            return Err(ClassifierError::dimension(
                self.rows * other.cols,
                out.rows * out.cols,
            ));
        }
        gemm(
            self.rows,
            other.cols,
            self.cols,
            &self.data,
            self.cols,
            &other.data,
            other.cols,
            &mut out.data,
            other.cols,
            false,
            false,
            1.0,
            0.0,
        );
        Ok(())
    }

    /// `self · other` into a new matrix.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        let mut out = Matrix::zeros(self.rows, other.cols);
        self.matmul_into(other, &mut out)?;
        Ok(out)
    }
}

/// General matrix multiply on row-major buffers:
/// `C = alpha * op(A) · op(B) + beta * C`, where op(A) is `m × k` and op(B) is `k × n`.
///
/// The signature mirrors CBLAS `dgemm` with `Layout::RowMajor`. With the `blas`
/// feature the call is forwarded to the linked CBLAS; otherwise a portable loop
/// ordering is used that walks `B` and `C` rows contiguously.
#[allow(clippy::too_many_arguments)]
pub fn gemm(
    m: usize,
    n: usize,
    k: usize,
    a: &[f64],
    lda: usize,
    b: &[f64],
    ldb: usize,
    c: &mut [f64],
    ldc: usize,
    transpose_a: bool,
    transpose_b: bool,
    alpha: f64,
    beta: f64,
) {
    if m == 0 || n == 0 {
        return;
    }

    #[cfg(feature = "blas")]
    {
        if k > 0 {
            use cblas::{dgemm, Layout, Transpose};
            let trans_a = if transpose_a {
                Transpose::Ordinary
            } else {
                Transpose::None
            };
            let trans_b = if transpose_b {
                Transpose::Ordinary
            } else {
                Transpose::None
            };
            unsafe {
                dgemm(
                    Layout::RowMajor,
                    trans_a,
                    trans_b,
                    m as i32,
                    n as i32,
                    k as i32,
                    alpha,
                    a,
                    lda as i32,
                    b,
                    ldb as i32,
                    beta,
                    c,
                    ldc as i32,
                );
            }
            return;
        }
    }

    gemm_portable(
        m,
        n,
        k,
        a,
        lda,
        b,
        ldb,
        c,
        ldc,
        transpose_a,
        transpose_b,
        alpha,
        beta,
    );
}

#[allow(clippy::too_many_arguments)]
fn gemm_portable(
    m: usize,
    n: usize,
    k: usize,
    a: &[f64],
    lda: usize,
    b: &[f64],
    ldb: usize,
    c: &mut [f64],
    ldc: usize,
    transpose_a: bool,
    transpose_b: bool,
    alpha: f64,
    beta: f64,
) {
    for i in 0..m {
        let c_row = &mut c[i * ldc..i * ldc + n];
        if beta == 0.0 {
            c_row.fill(0.0);
        } else if beta != 1.0 {
            for value in c_row.iter_mut() {
                *value *= beta;
            }
        }
    }

    // Accumulates alpha * a_ip * op(B)[p, :] into row i of C.
    let accumulate = |c: &mut [f64], i: usize, p: usize, a_ip: f64| {
        let scaled = alpha * a_ip;
        if scaled == 0.0 {
            return;
        }
        let c_row = &mut c[i * ldc..i * ldc + n];
        if transpose_b {
            for (j, value) in c_row.iter_mut().enumerate() {
                *value += scaled * b[j * ldb + p];
            }
        } else {
            let b_row = &b[p * ldb..p * ldb + n];
            for (value, &bv) in c_row.iter_mut().zip(b_row) {
                *value += scaled * bv;
            }
        }
    };

    if transpose_a {
        // A is stored k × m: walk its rows contiguously.
        for p in 0..k {
            let a_row = &a[p * lda..p * lda + m];
            for (i, &a_ip) in a_row.iter().enumerate() {
                accumulate(&mut *c, i, p, a_ip);
            }
        }
    } else {
        for i in 0..m {
            for p in 0..k {
                accumulate(&mut *c, i, p, a[i * lda + p]);
            }
        }
    }
}
