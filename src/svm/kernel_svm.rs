//! One-vs-rest kernel SVM trained by dual coordinate descent

use serde::Serialize;
use tracing::{debug, info};

use super::kernel::{cross_kernel, GramMatrix, Kernel};
use super::{ClassifierTrainer, Scorer};
use crate::error::{ClassifierError, Result};
use crate::utils::{argmax_rows, Matrix, SimpleRng};

/// Query rows scored per kernel block at prediction time.
const PREDICT_BLOCK_ROWS: usize = 512;

/// Projected gradients below this magnitude are treated as zero.
const PG_EPSILON: f64 = 1e-12;

/// Training parameters for `KernelSvm`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SvmParams {
    /// Regularization strength; larger values penalize margin violations more.
    pub c: f64,
    pub kernel: Kernel,
    /// Stop when max - min projected gradient is at or below this.
    pub tolerance: f64,
    /// Passes over the training set per one-vs-rest problem.
    pub max_epochs: usize,
    /// Seed for the per-epoch coordinate order.
    pub seed: u64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: Kernel::rbf_scaled(),
            tolerance: 1e-3,
            max_epochs: 200,
            seed: 100,
        }
    }
}

/// Kernel SVM trainer.
///
/// # Example
///
/// ```ignore
/// let trainer = KernelSvm::new(SvmParams { c: 10.0, ..SvmParams::default() });
/// let model = trainer.fit(&train.data, &train.labels)?;
/// let acc = model.score(&test.data, &test.labels)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct KernelSvm {
    params: SvmParams,
}

impl KernelSvm {
    pub fn new(params: SvmParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SvmParams {
        &self.params
    }
}

/// Dual variables for one binary problem.
struct DualSolution {
    alpha: Vec<f64>,
    epochs: usize,
    converged: bool,
}

fn solve_dual(gram: &GramMatrix, y: &[f64], params: &SvmParams, rng: &mut SimpleRng) -> DualSolution {
    let n = gram.len();
    let c = params.c;
    let mut alpha = vec![0.0; n];
    // decision[j] = Σ_i α_i y_i K'(x_i, x_j)
    let mut decision = vec![0.0; n];
    let mut order: Vec<usize> = (0..n).collect();
    let mut epochs = 0;
    let mut converged = false;

    while epochs < params.max_epochs {
        rng.shuffle(&mut order);
        let mut pg_max = f64::NEG_INFINITY;
        let mut pg_min = f64::INFINITY;

        for &i in &order {
            let g = y[i] * decision[i] - 1.0;
            let pg = if alpha[i] <= 0.0 {
                g.min(0.0)
            } else if alpha[i] >= c {
                g.max(0.0)
            } else {
                g
            };
            pg_max = pg_max.max(pg);
            pg_min = pg_min.min(pg);

            if pg.abs() > PG_EPSILON {
                let updated = (alpha[i] - g / gram.diagonal(i)).clamp(0.0, c);
                let delta = (updated - alpha[i]) * y[i];
                alpha[i] = updated;
                if delta != 0.0 {
                    for (value, &k) in decision.iter_mut().zip(gram.row(i)) {
                        *value += delta * f64::from(k);
                    }
                }
            }
        }

        epochs += 1;
        if pg_max - pg_min <= params.tolerance {
            converged = true;
            break;
        }
    }

    DualSolution {
        alpha,
        epochs,
        converged,
    }
}

impl ClassifierTrainer for KernelSvm {
    type Model = KernelSvmModel;

    fn fit(&self, data: &Matrix, labels: &[usize]) -> Result<KernelSvmModel> {
        let n = data.rows();
        if n == 0 {
            return Err(ClassifierError::EmptyInput("no training samples".to_string()));
        }
        if labels.len() != n {
            return Err(ClassifierError::dimension(n, labels.len()));
        }
        let num_classes = labels.iter().copied().max().map_or(0, |max| max + 1);

        let kernel = self.params.kernel.resolve(data);
        let gram = GramMatrix::compute(&kernel, data);
        let mut rng = SimpleRng::new(self.params.seed);
        let mut coefficients = Matrix::zeros(n, num_classes);

        for class in 0..num_classes {
            let y: Vec<f64> = labels
                .iter()
                .map(|&label| if label == class { 1.0 } else { -1.0 })
                .collect();
            let solution = solve_dual(&gram, &y, &self.params, &mut rng);

            let support = solution.alpha.iter().filter(|&&a| a > 0.0).count();
            debug!(
                class,
                support,
                epochs = solution.epochs,
                converged = solution.converged,
                "solved one-vs-rest dual"
            );
            for (i, (&a, &yi)) in solution.alpha.iter().zip(&y).enumerate() {
                coefficients.set(i, class, a * yi);
            }
        }

        let support_rows: Vec<usize> = (0..n)
            .filter(|&i| coefficients.row(i).iter().any(|&v| v != 0.0))
            .collect();
        let support = data.select_rows(&support_rows);
        let coefficients = coefficients.select_rows(&support_rows);

        info!(
            kernel = %kernel.label(),
            c = self.params.c,
            samples = n,
            support_vectors = support_rows.len(),
            "fitted kernel svm"
        );

        Ok(KernelSvmModel {
            kernel,
            support_norms: support.row_norms_squared(),
            support,
            coefficients,
            num_features: data.cols(),
        })
    }
}

/// Support vectors with per-class dual coefficients α_i y_i.
#[derive(Debug, Clone)]
pub struct KernelSvmModel {
    kernel: Kernel,
    support: Matrix,
    support_norms: Vec<f64>,
    /// `n_support × K`
    coefficients: Matrix,
    num_features: usize,
}

impl KernelSvmModel {
    /// Kernel with its width resolved against the training data.
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn num_support(&self) -> usize {
        self.support.rows()
    }

    pub fn num_classes(&self) -> usize {
        self.coefficients.cols()
    }

    /// Per-class decision values, `data.rows() × K`.
    pub fn decision_function(&self, data: &Matrix) -> Result<Matrix> {
        if data.cols() != self.num_features {
            return Err(ClassifierError::dimension(self.num_features, data.cols()));
        }
        let k = self.num_classes();
        let mut scores = Matrix::zeros(data.rows(), k);

        for start in (0..data.rows()).step_by(PREDICT_BLOCK_ROWS) {
            let end = (start + PREDICT_BLOCK_ROWS).min(data.rows());
            let rows: Vec<usize> = (start..end).collect();
            let block = data.select_rows(&rows);
            let kernel_block = cross_kernel(&self.kernel, &block, &self.support, &self.support_norms);
            let block_scores = kernel_block.matmul(&self.coefficients)?;
            scores.as_mut_slice()[start * k..end * k].copy_from_slice(block_scores.as_slice());
        }
        Ok(scores)
    }
}

impl Scorer for KernelSvmModel {
    fn predict(&self, data: &Matrix) -> Result<Vec<usize>> {
        let scores = self.decision_function(data)?;
        Ok(argmax_rows(scores.as_slice(), scores.rows(), scores.cols()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_clusters() -> (Matrix, Vec<usize>) {
        let data = Matrix::from_rows(&[
            vec![0.0, 0.1],
            vec![0.1, 0.0],
            vec![0.05, 0.05],
            vec![1.0, 0.9],
            vec![0.9, 1.0],
            vec![0.95, 0.95],
        ])
        .unwrap();
        (data, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn test_linear_svm_separates_clusters() {
        let (data, labels) = two_clusters();
        let trainer = KernelSvm::new(SvmParams {
            c: 10.0,
            kernel: Kernel::Linear,
            ..SvmParams::default()
        });
        let model = trainer.fit(&data, &labels).unwrap();
        assert_eq!(model.score(&data, &labels).unwrap(), 1.0);
        assert!(model.num_support() > 0);
        assert!(model.num_support() <= 6);
    }

    #[test]
    fn test_rbf_scaled_resolves_gamma() {
        let (data, labels) = two_clusters();
        let model = KernelSvm::default().fit(&data, &labels).unwrap();
        assert!(matches!(model.kernel(), Kernel::Rbf { gamma: Some(g) } if g > 0.0));
        assert_eq!(model.predict(&data).unwrap(), labels);
    }

    #[test]
    fn test_fit_rejects_label_mismatch() {
        let (data, _) = two_clusters();
        assert!(KernelSvm::default().fit(&data, &[0, 1]).is_err());
    }

    #[test]
    fn test_decision_function_checks_width() {
        let (data, labels) = two_clusters();
        let model = KernelSvm::default().fit(&data, &labels).unwrap();
        assert!(model.decision_function(&Matrix::zeros(1, 3)).is_err());
    }

    #[test]
    fn test_dual_respects_box_constraint() {
        let (data, labels) = two_clusters();
        let gram = GramMatrix::compute(&Kernel::Linear, &data);
        let y: Vec<f64> = labels.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();
        let params = SvmParams {
            c: 0.05,
            kernel: Kernel::Linear,
            ..SvmParams::default()
        };
        let solution = solve_dual(&gram, &y, &params, &mut SimpleRng::new(1));
        assert!(solution.alpha.iter().all(|&a| (0.0..=0.05).contains(&a)));
    }
}
