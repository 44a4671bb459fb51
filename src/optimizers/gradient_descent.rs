//! Fixed-step gradient descent
//!
//! Applies the basic update `params = params - learning_rate * gradient` for a
//! fixed number of iterations. Because a fixed step can overshoot, the result
//! carries the parameters with the lowest loss seen rather than the last iterate.

use tracing::debug;

use super::{inf_norm, Minimizer, MinimizeResult, Objective, Termination};
use crate::error::{ClassifierError, Result};

/// Full-batch gradient descent minimizer.
///
/// `w = w - η * ∇L/∂w`
///
/// # Example
///
/// ```ignore
/// use rust_digit_classifiers::optimizers::{GradientDescent, Minimizer};
///
/// let mut gd = GradientDescent::new(0.5, 200);
/// let result = gd.minimize(&mut objective, &initial)?;
/// ```
#[derive(Debug, Clone)]
pub struct GradientDescent {
    learning_rate: f64,
    max_iterations: usize,
    gradient_tolerance: f64,
}

impl GradientDescent {
    /// Creates a minimizer with the given step size and iteration budget.
    pub fn new(learning_rate: f64, max_iterations: usize) -> Self {
        Self {
            learning_rate,
            max_iterations,
            gradient_tolerance: 1e-5,
        }
    }

    pub fn with_gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = tolerance;
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Set a new step size.
    pub fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}

impl Minimizer for GradientDescent {
    fn minimize(&mut self, objective: &mut dyn Objective, initial: &[f64]) -> Result<MinimizeResult> {
        let n = objective.dim();
        if initial.len() != n {
            return Err(ClassifierError::dimension(n, initial.len()));
        }

        let mut params = initial.to_vec();
        let mut gradient = vec![0.0; n];
        let mut loss = objective.evaluate(&params, &mut gradient);
        let mut evaluations = 1;

        let mut best_params = params.clone();
        let mut best_loss = loss;
        let mut termination = Termination::MaxIterations;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            if inf_norm(&gradient) <= self.gradient_tolerance {
                termination = Termination::Converged;
                break;
            }

            for (param, grad) in params.iter_mut().zip(gradient.iter()) {
                *param -= self.learning_rate * grad;
            }
            loss = objective.evaluate(&params, &mut gradient);
            evaluations += 1;
            iterations += 1;

            if loss < best_loss {
                best_loss = loss;
                best_params.copy_from_slice(&params);
            }
            debug!(iteration = iterations, loss, "gd iteration");
        }

        if termination == Termination::MaxIterations && inf_norm(&gradient) <= self.gradient_tolerance {
            termination = Termination::Converged;
        }
        // The gradient check applies to the last iterate; report it only if that is the best.
        if termination == Termination::Converged && loss > best_loss {
            termination = Termination::MaxIterations;
        }

        Ok(MinimizeResult {
            params: best_params,
            loss: best_loss,
            iterations,
            evaluations,
            termination,
        })
    }

    fn name(&self) -> &'static str {
        "gradient_descent"
    }

    fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f(x) = 0.5 * Σ x_i^2
    struct Bowl;

    impl Objective for Bowl {
        fn dim(&self) -> usize {
            2
        }

        fn evaluate(&mut self, params: &[f64], grad: &mut [f64]) -> f64 {
            grad.copy_from_slice(params);
            0.5 * params.iter().map(|x| x * x).sum::<f64>()
        }
    }

    #[test]
    fn test_gd_new() {
        let gd = GradientDescent::new(0.01, 10);
        assert_eq!(gd.learning_rate(), 0.01);
        assert_eq!(gd.max_iterations(), 10);
    }

    #[test]
    fn test_gd_single_step() {
        let mut gd = GradientDescent::new(0.1, 1);
        let result = gd.minimize(&mut Bowl, &[1.0, -2.0]).unwrap();
        assert!((result.params[0] - 0.9).abs() < 1e-12);
        assert!((result.params[1] + 1.8).abs() < 1e-12);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.evaluations, 2);
    }

    #[test]
    fn test_gd_converges_on_bowl() {
        let mut gd = GradientDescent::new(0.5, 500).with_gradient_tolerance(1e-10);
        let result = gd.minimize(&mut Bowl, &[3.0, 4.0]).unwrap();
        assert!(result.converged());
        assert!(result.loss < 1e-18);
    }

    #[test]
    fn test_gd_keeps_best_when_diverging() {
        // Step 2.5 on the bowl multiplies x by -1.5 each iteration.
        let mut gd = GradientDescent::new(2.5, 5);
        let result = gd.minimize(&mut Bowl, &[1.0, 0.0]).unwrap();
        assert_eq!(result.params, vec![1.0, 0.0]);
        assert!((result.loss - 0.5).abs() < 1e-12);
        assert_eq!(result.termination, Termination::MaxIterations);
    }

    #[test]
    fn test_gd_learning_rate_update() {
        let mut gd = GradientDescent::new(0.1, 1);
        gd.set_learning_rate(0.01);
        let result = gd.minimize(&mut Bowl, &[1.0, 1.0]).unwrap();
        assert!((result.params[0] - 0.99).abs() < 1e-12);
    }
}
