//! One-vs-rest binary logistic regression
//!
//! For a bias-augmented data matrix X (N × (D+1)), weights w ((D+1)) and a
//! 0/1 indicator y:
//!
//! - θ = sigmoid(X · w)
//! - loss = -(1/N) Σ [ y log θ + (1 - y) log(1 - θ) ]
//! - grad = (1/N) Xᵀ (θ - y)
//!
//! θ is clamped into `[PROB_EPSILON, 1 - PROB_EPSILON]` before the logarithms;
//! the gradient uses the unclamped θ.

use tracing::{debug, info, trace};

use super::{check_labels, logits, ClassifierStrategy, FitSummary, FittedModel};
use crate::data::{binary_indicator, Split};
use crate::error::{ClassifierError, Result};
use crate::optimizers::{Minimizer, Objective};
use crate::utils::activations::sigmoid_inplace;
use crate::utils::{clamp_probability, gemm, sigmoid, Matrix};

/// Binary logistic loss over a borrowed, bias-augmented data matrix.
///
/// The data is shared read-only across the K one-vs-rest problems; only the
/// N-length residual buffer is owned and reused between evaluations.
pub struct BinaryObjective<'a> {
    data: &'a Matrix,
    labels: &'a [f64],
    residual: Vec<f64>,
    clamped: usize,
}

impl<'a> BinaryObjective<'a> {
    /// `augmented` must already carry the leading constant-1 column.
    ///
    /// # Errors
    ///
    /// `EmptyInput` for zero rows, `DimensionMismatch` if `labels` does not
    /// have one entry per row.
    pub fn new(augmented: &'a Matrix, labels: &'a [f64]) -> Result<Self> {
        check_labels(labels.len(), augmented.rows())?;
        Ok(Self {
            data: augmented,
            labels,
            residual: vec![0.0; augmented.rows()],
            clamped: 0,
        })
    }

    /// Probabilities clamped during the most recent evaluation.
    pub fn clamped_last_eval(&self) -> usize {
        self.clamped
    }

    /// Loss and gradient at `weights`, with a length check.
    pub fn loss_and_gradient(&mut self, weights: &[f64]) -> Result<(f64, Vec<f64>)> {
        if weights.len() != self.dim() {
            return Err(ClassifierError::dimension(self.dim(), weights.len()));
        }
        let mut grad = vec![0.0; weights.len()];
        let loss = self.evaluate(weights, &mut grad);
        Ok((loss, grad))
    }
}

impl Objective for BinaryObjective<'_> {
    fn dim(&self) -> usize {
        self.data.cols()
    }

    fn evaluate(&mut self, params: &[f64], grad: &mut [f64]) -> f64 {
        let n = self.data.rows();
        let d1 = self.data.cols();

        // residual = X · w
        gemm(
            n,
            1,
            d1,
            self.data.as_slice(),
            d1,
            params,
            1,
            &mut self.residual,
            1,
            false,
            false,
            1.0,
            0.0,
        );

        let mut loss = 0.0;
        let mut clamped = 0;
        for (z, &y) in self.residual.iter_mut().zip(self.labels) {
            let theta = sigmoid(*z);
            let (p, was_clamped) = clamp_probability(theta);
            clamped += usize::from(was_clamped);
            loss -= y * p.ln() + (1.0 - y) * (1.0 - p).ln();
            *z = theta - y;
        }
        let loss = loss / n as f64;

        // grad = (1/N) Xᵀ (θ - y)
        gemm(
            d1,
            1,
            n,
            self.data.as_slice(),
            d1,
            &self.residual,
            1,
            grad,
            1,
            true,
            false,
            1.0 / n as f64,
            0.0,
        );

        self.clamped = clamped;
        if clamped > 0 {
            debug!(clamped, "binary objective clamped probabilities");
        }
        trace!(loss, "binary objective");
        loss
    }
}

/// Sigmoid scores for every class: θ = sigmoid([1 | data] · W), N × K.
///
/// Logits above about 37 saturate to exactly 1.0, so such classes tie and the
/// arg-max falls back to the lowest index among them.
pub fn binary_probabilities(weights: &Matrix, data: &Matrix) -> Result<Matrix> {
    let mut theta = logits(weights, data)?;
    sigmoid_inplace(theta.as_mut_slice());
    Ok(theta)
}

/// Arg-max over per-class sigmoid scores; ties go to the lowest class index.
pub fn predict_binary(weights: &Matrix, data: &Matrix) -> Result<Vec<usize>> {
    OneVsRest.predict(weights, data)
}

/// K independent binary problems, one per class.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneVsRest;

impl ClassifierStrategy for OneVsRest {
    fn name(&self) -> &'static str {
        "one_vs_rest"
    }

    fn fit(&self, train: &Split, num_classes: usize, minimizer: &mut dyn Minimizer) -> Result<FittedModel> {
        let augmented = train.data.with_bias_column();
        let d1 = augmented.cols();
        let initial = vec![0.0; d1];
        let mut weights = Matrix::zeros(d1, num_classes);
        let mut fits = Vec::with_capacity(num_classes);

        for class in 0..num_classes {
            let labels = binary_indicator(&train.labels, class);
            let mut objective = BinaryObjective::new(&augmented, &labels)?;
            let result = minimizer.minimize(&mut objective, &initial)?;

            info!(
                class,
                loss = result.loss,
                iterations = result.iterations,
                termination = result.termination.label(),
                "fitted one-vs-rest classifier"
            );

            weights.set_column(class, &result.params)?;
            fits.push(FitSummary {
                class: Some(class),
                loss: result.loss,
                iterations: result.iterations,
                termination: result.termination,
            });
        }

        Ok(FittedModel { weights, fits })
    }

    fn probabilities(&self, weights: &Matrix, data: &Matrix) -> Result<Matrix> {
        binary_probabilities(weights, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_weights_loss_is_ln2() {
        let data = Matrix::from_rows(&[vec![0.2, 0.4], vec![0.9, 0.1]]).unwrap().with_bias_column();
        let labels = [1.0, 0.0];
        let mut objective = BinaryObjective::new(&data, &labels).unwrap();
        let (loss, grad) = objective.loss_and_gradient(&[0.0; 3]).unwrap();

        assert!((loss - std::f64::consts::LN_2).abs() < 1e-12);
        // θ - y = [-0.5, 0.5]; grad = (1/2) Xᵀ (θ - y)
        assert!((grad[0] - 0.0).abs() < 1e-12);
        assert!((grad[1] - 0.175).abs() < 1e-12);
        assert!((grad[2] + 0.075).abs() < 1e-12);
    }

    #[test]
    fn test_saturated_logits_stay_finite() {
        let data = Matrix::from_rows(&[vec![1.0], vec![1.0]]).unwrap().with_bias_column();
        let labels = [0.0, 1.0];
        let mut objective = BinaryObjective::new(&data, &labels).unwrap();
        let (loss, grad) = objective.loss_and_gradient(&[0.0, 1e4]).unwrap();

        assert!(loss.is_finite());
        assert!(grad.iter().all(|g| g.is_finite()));
        assert_eq!(objective.clamped_last_eval(), 2);
    }

    #[test]
    fn test_label_length_mismatch() {
        let data = Matrix::zeros(3, 2);
        assert!(BinaryObjective::new(&data, &[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_weight_length_mismatch() {
        let data = Matrix::zeros(2, 3);
        let labels = [0.0, 1.0];
        let mut objective = BinaryObjective::new(&data, &labels).unwrap();
        assert!(objective.loss_and_gradient(&[0.0; 2]).is_err());
    }

    #[test]
    fn test_predict_binary_picks_highest_score() {
        // Class 1 scores x, class 0 scores -x.
        let weights = Matrix::from_rows(&[vec![0.0, 0.0], vec![-1.0, 1.0]]).unwrap();
        let data = Matrix::from_rows(&[vec![2.0], vec![-3.0]]).unwrap();
        assert_eq!(predict_binary(&weights, &data).unwrap(), vec![1, 0]);
    }
}
