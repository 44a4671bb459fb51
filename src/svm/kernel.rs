//! Kernel functions and Gram matrix construction
//!
//! Kernels are evaluated from dot products and squared row norms so that
//! whole blocks can be computed with one GEMM:
//! `‖a - b‖² = ‖a‖² + ‖b‖² - 2 a·b`.
//! Every kernel value carries a constant +1, which plays the role of an
//! unregularized-in-the-dual bias feature.

use serde::Serialize;

use crate::utils::{gemm, Matrix};

/// Rows per GEMM block when building kernel matrices.
const BLOCK_ROWS: usize = 256;

/// Kernel choice for the SVM trainer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Kernel {
    Linear,
    /// `exp(-gamma ‖a - b‖²)`; `gamma: None` resolves to 1 / (D · Var(X)) at fit time.
    Rbf { gamma: Option<f64> },
}

impl Kernel {
    /// RBF kernel with an explicit width.
    pub fn rbf(gamma: f64) -> Self {
        Self::Rbf { gamma: Some(gamma) }
    }

    /// RBF kernel using the scale heuristic.
    pub fn rbf_scaled() -> Self {
        Self::Rbf { gamma: None }
    }

    /// Fix an unset RBF width against the training data.
    pub fn resolve(self, data: &Matrix) -> Self {
        match self {
            Self::Rbf { gamma: None } => Self::Rbf {
                gamma: Some(scale_gamma(data)),
            },
            other => other,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Linear => "linear".to_string(),
            Self::Rbf { gamma: None } => "rbf(gamma=scale)".to_string(),
            Self::Rbf { gamma: Some(g) } => format!("rbf(gamma={g})"),
        }
    }

    /// Kernel value plus the bias constant.
    fn value(&self, dot: f64, norm_a: f64, norm_b: f64) -> f64 {
        let k = match self {
            Self::Linear => dot,
            Self::Rbf { gamma } => {
                let gamma = gamma.unwrap_or(1.0);
                (-gamma * (norm_a + norm_b - 2.0 * dot).max(0.0)).exp()
            }
        };
        k + 1.0
    }
}

/// `1 / (D · Var(X))`, with Var over every entry; 1.0 for constant data.
pub fn scale_gamma(data: &Matrix) -> f64 {
    let spread = data.cols() as f64 * data.variance();
    if spread > 0.0 {
        1.0 / spread
    } else {
        1.0
    }
}

/// Kernel matrix between the rows of `a` and `b`, `a.rows() × b.rows()`,
/// written into `out` (row-major) through `store`.
///
/// `a_norms`/`b_norms` are the squared row norms.
fn kernel_blocks<T>(
    kernel: &Kernel,
    a: &Matrix,
    a_norms: &[f64],
    b: &Matrix,
    b_norms: &[f64],
    out: &mut [T],
    store: impl Fn(f64) -> T,
) {
    let d = a.cols();
    let n = b.rows();
    if n == 0 || a.rows() == 0 {
        return;
    }
    let mut dots = vec![0.0; BLOCK_ROWS.min(a.rows()) * n];

    for start in (0..a.rows()).step_by(BLOCK_ROWS) {
        let rows = BLOCK_ROWS.min(a.rows() - start);
        let block = &a.as_slice()[start * d..(start + rows) * d];
        let dots = &mut dots[..rows * n];
        gemm(rows, n, d, block, d, b.as_slice(), d, dots, n, false, true, 1.0, 0.0);

        for (r, dot_row) in dots.chunks_exact(n).enumerate() {
            let i = start + r;
            let out_row = &mut out[i * n..(i + 1) * n];
            for ((slot, &dot), &norm_b) in out_row.iter_mut().zip(dot_row).zip(b_norms) {
                *slot = store(kernel.value(dot, a_norms[i], norm_b));
            }
        }
    }
}

/// Symmetric training Gram matrix stored as f32 to halve its footprint.
pub struct GramMatrix {
    n: usize,
    values: Vec<f32>,
}

impl GramMatrix {
    pub fn compute(kernel: &Kernel, data: &Matrix) -> Self {
        let n = data.rows();
        let norms = data.row_norms_squared();
        let mut values = vec![0.0f32; n * n];
        kernel_blocks(kernel, data, &norms, data, &norms, &mut values, |v| v as f32);
        Self { n, values }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    pub fn diagonal(&self, i: usize) -> f64 {
        f64::from(self.values[i * self.n + i])
    }
}

/// Kernel values between `queries` and `support`, `queries.rows() × support.rows()`.
pub fn cross_kernel(kernel: &Kernel, queries: &Matrix, support: &Matrix, support_norms: &[f64]) -> Matrix {
    let query_norms = queries.row_norms_squared();
    let mut out = Matrix::zeros(queries.rows(), support.rows());
    kernel_blocks(
        kernel,
        queries,
        &query_norms,
        support,
        support_norms,
        out.as_mut_slice(),
        |v| v,
    );
    out
}
