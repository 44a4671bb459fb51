//! Logistic regression classifiers
//!
//! Two training strategies share one shape: a `(D+1) × K` weight matrix whose
//! row 0 holds the biases and whose column k scores class k against
//! bias-augmented samples. They differ in how the weights are fitted and how
//! scores become probabilities:
//!
//! - `OneVsRest`: K independent binary objectives, sigmoid per entry
//! - `Multinomial`: one joint softmax objective, softmax per row
//!
//! In both cases the predicted label is the first column holding the row maximum.

pub mod binary;
pub mod multinomial;

pub use binary::{predict_binary, BinaryObjective, OneVsRest};
pub use multinomial::{predict_multinomial, Multinomial, MultinomialObjective};

use crate::data::Split;
use crate::error::{ClassifierError, Result};
use crate::optimizers::{Minimizer, Termination};
use crate::utils::{argmax_rows, Matrix};

/// Outcome of one minimizer run inside a fit.
#[derive(Debug, Clone)]
pub struct FitSummary {
    /// Class for one-vs-rest fits; `None` for a joint fit.
    pub class: Option<usize>,
    pub loss: f64,
    pub iterations: usize,
    pub termination: Termination,
}

/// Fitted weights plus the per-run summaries that produced them.
#[derive(Debug, Clone)]
pub struct FittedModel {
    /// `(D+1) × K`; row 0 is the bias row.
    pub weights: Matrix,
    pub fits: Vec<FitSummary>,
}

impl FittedModel {
    /// Number of minimizer runs that met their gradient tolerance.
    pub fn converged_runs(&self) -> usize {
        self.fits
            .iter()
            .filter(|fit| fit.termination == Termination::Converged)
            .count()
    }

    pub fn final_losses(&self) -> Vec<f64> {
        self.fits.iter().map(|fit| fit.loss).collect()
    }
}

/// A way of fitting and applying a `(D+1) × K` logistic weight matrix.
pub trait ClassifierStrategy {
    fn name(&self) -> &'static str;

    /// Fit weights for `num_classes` classes on `train`.
    fn fit(&self, train: &Split, num_classes: usize, minimizer: &mut dyn Minimizer) -> Result<FittedModel>;

    /// Per-row class probabilities (or per-class scores) for `data` (N × D).
    fn probabilities(&self, weights: &Matrix, data: &Matrix) -> Result<Matrix>;

    /// Arg-max label per row of `data`, lowest index on ties.
    fn predict(&self, weights: &Matrix, data: &Matrix) -> Result<Vec<usize>> {
        let probs = self.probabilities(weights, data)?;
        Ok(argmax_rows(probs.as_slice(), probs.rows(), probs.cols()))
    }
}

/// `[1 | data] · weights`, the N × K score matrix.
///
/// # Errors
///
/// `DimensionMismatch` unless `weights.rows() == data.cols() + 1`.
pub fn logits(weights: &Matrix, data: &Matrix) -> Result<Matrix> {
    if weights.rows() != data.cols() + 1 {
        return Err(ClassifierError::dimension(data.cols() + 1, weights.rows()));
    }
    data.with_bias_column().matmul(weights)
}

pub(crate) fn check_labels(labels_len: usize, rows: usize) -> Result<()> {
    if rows == 0 {
        return Err(ClassifierError::EmptyInput("no training samples".to_string()));
    }
    if labels_len != rows {
        return Err(ClassifierError::dimension(rows, labels_len));
    }
    Ok(())
}
