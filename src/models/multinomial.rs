//! Multinomial (softmax) logistic regression
//!
//! Parameters are the `(D+1) × K` weight matrix flattened row-major, so
//! `params[d * K + k]` is the weight of feature d (0 = bias) for class k.
//!
//! - θ = softmax_rows([1 | X] · W)
//! - loss = -(1/N) Σ_i Σ_k Y_ik log θ_ik
//! - grad = (1/N) [1 | X]ᵀ (θ - Y)

use tracing::{debug, info, trace};

use super::{check_labels, logits, ClassifierStrategy, FitSummary, FittedModel};
use crate::data::{one_hot, Split};
use crate::error::{ClassifierError, Result};
use crate::optimizers::{Minimizer, Objective};
use crate::utils::{clamp_probability, gemm, softmax_rows, Matrix};

/// Joint softmax loss over a borrowed bias-augmented data matrix and one-hot targets.
///
/// The N × K probability buffer is allocated once and reused by every evaluation.
pub struct MultinomialObjective<'a> {
    data: &'a Matrix,
    targets: &'a Matrix,
    probs: Vec<f64>,
    clamped: usize,
}

impl<'a> MultinomialObjective<'a> {
    /// `augmented` must already carry the leading constant-1 column;
    /// `targets` is N × K.
    pub fn new(augmented: &'a Matrix, targets: &'a Matrix) -> Result<Self> {
        check_labels(targets.rows(), augmented.rows())?;
        if targets.cols() == 0 {
            return Err(ClassifierError::EmptyInput("no classes".to_string()));
        }
        Ok(Self {
            data: augmented,
            targets,
            probs: vec![0.0; targets.rows() * targets.cols()],
            clamped: 0,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.targets.cols()
    }

    /// Probabilities clamped during the most recent evaluation.
    pub fn clamped_last_eval(&self) -> usize {
        self.clamped
    }

    /// Loss and flattened gradient at `weights`, with a length check.
    pub fn loss_and_gradient(&mut self, weights: &[f64]) -> Result<(f64, Vec<f64>)> {
        if weights.len() != self.dim() {
            return Err(ClassifierError::dimension(self.dim(), weights.len()));
        }
        let mut grad = vec![0.0; weights.len()];
        let loss = self.evaluate(weights, &mut grad);
        Ok((loss, grad))
    }
}

impl Objective for MultinomialObjective<'_> {
    fn dim(&self) -> usize {
        self.data.cols() * self.targets.cols()
    }

    fn evaluate(&mut self, params: &[f64], grad: &mut [f64]) -> f64 {
        let n = self.data.rows();
        let d1 = self.data.cols();
        let k = self.targets.cols();

        gemm(
            n,
            k,
            d1,
            self.data.as_slice(),
            d1,
            params,
            k,
            &mut self.probs,
            k,
            false,
            false,
            1.0,
            0.0,
        );
        softmax_rows(&mut self.probs, n, k);

        let mut loss = 0.0;
        let mut clamped = 0;
        for (theta, &y) in self.probs.iter_mut().zip(self.targets.as_slice()) {
            if y != 0.0 {
                let (p, was_clamped) = clamp_probability(*theta);
                clamped += usize::from(was_clamped);
                loss -= y * p.ln();
            }
            *theta -= y;
        }
        let loss = loss / n as f64;

        gemm(
            d1,
            k,
            n,
            self.data.as_slice(),
            d1,
            &self.probs,
            k,
            grad,
            k,
            true,
            false,
            1.0 / n as f64,
            0.0,
        );

        self.clamped = clamped;
        if clamped > 0 {
            debug!(clamped, "multinomial objective clamped probabilities");
        }
        trace!(loss, "multinomial objective");
        loss
    }
}

/// Per-row softmax probabilities, N × K; every row sums to 1.
pub fn multinomial_probabilities(weights: &Matrix, data: &Matrix) -> Result<Matrix> {
    let mut theta = logits(weights, data)?;
    let (rows, cols) = theta.shape();
    softmax_rows(theta.as_mut_slice(), rows, cols);
    Ok(theta)
}

/// Arg-max over per-row softmax probabilities; ties go to the lowest class index.
pub fn predict_multinomial(weights: &Matrix, data: &Matrix) -> Result<Vec<usize>> {
    Multinomial.predict(weights, data)
}

/// A single joint minimization over all class weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multinomial;

impl ClassifierStrategy for Multinomial {
    fn name(&self) -> &'static str {
        "multinomial"
    }

    fn fit(&self, train: &Split, num_classes: usize, minimizer: &mut dyn Minimizer) -> Result<FittedModel> {
        let augmented = train.data.with_bias_column();
        let targets = one_hot(&train.labels, num_classes)?;
        let mut objective = MultinomialObjective::new(&augmented, &targets)?;
        let initial = vec![0.0; objective.dim()];
        let result = minimizer.minimize(&mut objective, &initial)?;

        info!(
            loss = result.loss,
            iterations = result.iterations,
            termination = result.termination.label(),
            "fitted multinomial classifier"
        );

        let fit = FitSummary {
            class: None,
            loss: result.loss,
            iterations: result.iterations,
            termination: result.termination,
        };
        let weights = Matrix::from_vec(augmented.cols(), num_classes, result.params)?;
        Ok(FittedModel {
            weights,
            fits: vec![fit],
        })
    }

    fn probabilities(&self, weights: &Matrix, data: &Matrix) -> Result<Matrix> {
        multinomial_probabilities(weights, data)
    }
}
