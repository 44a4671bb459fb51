//! Gradient-based minimizers
//!
//! This module defines the contract between loss functions and the routines
//! that minimize them. An `Objective` returns a scalar loss and writes its
//! exact gradient for a given parameter vector; a `Minimizer` starts from an
//! initial vector and iterates within an iteration budget.
//!
//! # Available Minimizers
//!
//! - `ConjugateGradient`: nonlinear conjugate gradient (Polak-Ribière+) with a
//!   strong-Wolfe line search
//! - `GradientDescent`: fixed-step steepest descent
//!
//! Running out of iterations is not an error: the result reports
//! `Termination::MaxIterations` and carries the best parameters found.
//!
//! # Example
//!
//! ```ignore
//! use rust_digit_classifiers::optimizers::{ConjugateGradient, Minimizer};
//!
//! let mut minimizer = ConjugateGradient::new(100);
//! let result = minimizer.minimize(&mut objective, &initial)?;
//! println!("loss {} after {} iterations", result.loss, result.iterations);
//! ```

pub mod conjugate_gradient;
pub mod gradient_descent;

pub use conjugate_gradient::ConjugateGradient;
pub use gradient_descent::GradientDescent;

use crate::error::Result;

/// A differentiable scalar loss over a flat parameter vector.
///
/// Implementations may reuse internal scratch buffers between calls, but the
/// returned loss and gradient must depend only on `params`.
pub trait Objective {
    /// Number of parameters.
    fn dim(&self) -> usize;

    /// Compute the loss at `params` and write its gradient into `grad`.
    ///
    /// Both slices have length `dim()`.
    fn evaluate(&mut self, params: &[f64], grad: &mut [f64]) -> f64;
}

/// Why a minimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Gradient infinity norm fell below the tolerance.
    Converged,
    /// Iteration budget exhausted.
    MaxIterations,
    /// No step along the search direction decreased the loss.
    LineSearchFailed,
}

impl Termination {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::MaxIterations => "max_iterations",
            Self::LineSearchFailed => "line_search_failed",
        }
    }
}

/// Outcome of a minimization run.
#[derive(Debug, Clone)]
pub struct MinimizeResult {
    /// Best parameters found.
    pub params: Vec<f64>,
    /// Loss at `params`.
    pub loss: f64,
    pub iterations: usize,
    /// Objective evaluations, including line search trials.
    pub evaluations: usize,
    pub termination: Termination,
}

impl MinimizeResult {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Core trait for minimizers.
pub trait Minimizer {
    /// Minimize `objective` starting from `initial`.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `initial.len() != objective.dim()`.
    fn minimize(&mut self, objective: &mut dyn Objective, initial: &[f64]) -> Result<MinimizeResult>;

    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Iteration budget.
    fn max_iterations(&self) -> usize;
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0f64, |acc, x| acc.max(x.abs()))
}
