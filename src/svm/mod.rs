//! Kernel support vector machine classifiers
//!
//! This module provides the trainer/scorer seam used by the experiment driver
//! and a one-vs-rest kernel SVM behind it.
//!
//! # Key Components
//!
//! - `ClassifierTrainer`: fit(features, labels) → model
//! - `Scorer`: predict(features) → labels, score(features, labels) → accuracy
//! - `KernelSvm`: hinge-loss SVM solved by dual coordinate descent
//! - `Kernel`: linear or RBF, each with a +1 bias term folded into the kernel
//!
//! # Algorithm Overview
//!
//! For each class c the labels become y_i = +1 (class c) or -1 (rest) and the
//! dual problem
//!
//! `min_α ½ αᵀQα - Σ α_i   s.t. 0 ≤ α_i ≤ C,   Q_ij = y_i y_j K'(x_i, x_j)`
//!
//! is solved one coordinate at a time in a shuffled order each epoch, with
//! the decision values kept up to date from the cached Gram matrix. Training
//! stops when the spread of projected gradients falls below `tolerance`.
//! The prediction is the class with the largest decision value.

pub mod kernel;
pub mod kernel_svm;

pub use kernel::{scale_gamma, Kernel};
pub use kernel_svm::{KernelSvm, KernelSvmModel, SvmParams};

use crate::error::Result;
use crate::experiment::accuracy;
use crate::utils::Matrix;

/// Fits a classifier on a feature matrix and its labels.
pub trait ClassifierTrainer {
    type Model: Scorer;

    fn fit(&self, data: &Matrix, labels: &[usize]) -> Result<Self::Model>;
}

/// A fitted classifier.
pub trait Scorer {
    /// Predicted label for every row of `data`.
    fn predict(&self, data: &Matrix) -> Result<Vec<usize>>;

    /// Fraction of rows whose prediction matches `labels`, in [0, 1].
    fn score(&self, data: &Matrix, labels: &[usize]) -> Result<f64> {
        let predicted = self.predict(data)?;
        accuracy(&predicted, labels)
    }
}
