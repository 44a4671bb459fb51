//! Nonlinear conjugate gradient minimizer
//!
//! Polak-Ribière+ conjugate gradient. Each iteration searches along the
//! current direction for a step satisfying the strong Wolfe conditions,
//! then mixes the new gradient into the direction with
//! `beta = max(0, g_new · (g_new - g) / (g · g))`. A direction that is not a
//! descent direction is replaced by the steepest-descent direction.

use tracing::debug;

use super::{dot, inf_norm, Minimizer, MinimizeResult, Objective, Termination};
use crate::error::{ClassifierError, Result};

/// Sufficient-decrease constant of the Wolfe conditions.
const C1: f64 = 1e-4;
/// Curvature constant of the Wolfe conditions.
const C2: f64 = 0.4;
const MAX_LINE_SEARCH_STEPS: usize = 20;

/// Nonlinear conjugate gradient minimizer.
///
/// # Example
///
/// ```ignore
/// let mut cg = ConjugateGradient::new(100).with_gradient_tolerance(1e-5);
/// let result = cg.minimize(&mut objective, &vec![0.0; objective.dim()])?;
/// ```
#[derive(Debug, Clone)]
pub struct ConjugateGradient {
    max_iterations: usize,
    gradient_tolerance: f64,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            gradient_tolerance: 1e-5,
        }
    }
}

impl ConjugateGradient {
    /// Creates a minimizer with the given iteration budget.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Stop once the gradient infinity norm is at or below `tolerance`.
    pub fn with_gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = tolerance;
        self
    }

    pub fn gradient_tolerance(&self) -> f64 {
        self.gradient_tolerance
    }
}

impl Minimizer for ConjugateGradient {
    fn minimize(&mut self, objective: &mut dyn Objective, initial: &[f64]) -> Result<MinimizeResult> {
        let n = objective.dim();
        if initial.len() != n {
            return Err(ClassifierError::dimension(n, initial.len()));
        }

        let mut x = initial.to_vec();
        let mut gradient = vec![0.0; n];
        let mut loss = objective.evaluate(&x, &mut gradient);
        let mut direction: Vec<f64> = gradient.iter().map(|g| -g).collect();
        let mut search = LineSearch::new(n);

        let mut previous_loss: Option<f64> = None;
        let mut restarted = false;
        let mut iterations = 0usize;
        let mut termination = Termination::MaxIterations;

        while iterations < self.max_iterations {
            if inf_norm(&gradient) <= self.gradient_tolerance {
                termination = Termination::Converged;
                break;
            }

            let mut slope = dot(&gradient, &direction);
            if slope >= 0.0 {
                set_steepest(&mut direction, &gradient);
                slope = -dot(&gradient, &gradient);
            }

            let initial_step = match previous_loss {
                Some(prev) if prev > loss => (2.02 * (loss - prev) / slope).min(1.0),
                _ => 1.0 / dot(&gradient, &gradient).sqrt().max(1.0),
            };
            let initial_step = if initial_step.is_finite() && initial_step > 0.0 {
                initial_step
            } else {
                1.0
            };

            match search.search(objective, &x, loss, &direction, slope, initial_step) {
                Some(step) => {
                    for (xi, di) in x.iter_mut().zip(&direction) {
                        *xi += step.alpha * di;
                    }

                    let new_gradient = &search.best_gradient;
                    let gg = dot(&gradient, &gradient);
                    let beta = if gg > 0.0 {
                        ((dot(new_gradient, new_gradient) - dot(new_gradient, &gradient)) / gg)
                            .max(0.0)
                    } else {
                        0.0
                    };
                    for (d, g) in direction.iter_mut().zip(new_gradient) {
                        *d = -g + beta * *d;
                    }
                    gradient.copy_from_slice(new_gradient);

                    previous_loss = Some(loss);
                    loss = step.loss;
                    iterations += 1;
                    restarted = false;
                    debug!(iteration = iterations, loss, step = step.alpha, "cg iteration");
                }
                None if !restarted => {
                    restarted = true;
                    previous_loss = None;
                    set_steepest(&mut direction, &gradient);
                }
                None => {
                    termination = Termination::LineSearchFailed;
                    break;
                }
            }
        }

        if termination == Termination::MaxIterations && inf_norm(&gradient) <= self.gradient_tolerance {
            termination = Termination::Converged;
        }

        Ok(MinimizeResult {
            params: x,
            loss,
            iterations,
            evaluations: 1 + search.evaluations,
            termination,
        })
    }

    fn name(&self) -> &'static str {
        "conjugate_gradient"
    }

    fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

fn set_steepest(direction: &mut [f64], gradient: &[f64]) {
    for (d, g) in direction.iter_mut().zip(gradient) {
        *d = -g;
    }
}

struct Step {
    alpha: f64,
    loss: f64,
}

/// Strong-Wolfe line search (bracketing then zoom with safeguarded
/// quadratic interpolation).
///
/// Owns its trial buffers so repeated searches do not allocate.
/// `best_gradient` holds the gradient at the accepted step after a
/// successful search.
struct LineSearch {
    trial: Vec<f64>,
    gradient: Vec<f64>,
    best_gradient: Vec<f64>,
    evaluations: usize,
}

impl LineSearch {
    fn new(n: usize) -> Self {
        Self {
            trial: vec![0.0; n],
            gradient: vec![0.0; n],
            best_gradient: vec![0.0; n],
            evaluations: 0,
        }
    }

    /// Loss and directional derivative at `x + alpha * direction`.
    fn phi(&mut self, objective: &mut dyn Objective, x: &[f64], direction: &[f64], alpha: f64) -> (f64, f64) {
        for ((t, xi), di) in self.trial.iter_mut().zip(x).zip(direction) {
            *t = xi + alpha * di;
        }
        let loss = objective.evaluate(&self.trial, &mut self.gradient);
        self.evaluations += 1;
        (loss, dot(&self.gradient, direction))
    }

    fn keep_gradient(&mut self) {
        self.best_gradient.copy_from_slice(&self.gradient);
    }

    fn search(
        &mut self,
        objective: &mut dyn Objective,
        x: &[f64],
        loss0: f64,
        direction: &[f64],
        slope0: f64,
        initial_step: f64,
    ) -> Option<Step> {
        let mut alpha_prev = 0.0;
        let mut loss_prev = loss0;
        let mut slope_prev = slope0;
        let mut alpha = initial_step;

        for i in 0..MAX_LINE_SEARCH_STEPS {
            let (loss, slope) = self.phi(objective, x, direction, alpha);

            if !loss.is_finite() || loss > loss0 + C1 * alpha * slope0 || (i > 0 && loss >= loss_prev) {
                let bracket = Bracket {
                    lo: alpha_prev,
                    loss_lo: loss_prev,
                    slope_lo: slope_prev,
                    hi: alpha,
                    loss_hi: sanitize(loss),
                };
                return self.zoom(objective, x, direction, loss0, slope0, bracket);
            }
            if slope.abs() <= -C2 * slope0 {
                self.keep_gradient();
                return Some(Step { alpha, loss });
            }
            if slope >= 0.0 {
                self.keep_gradient();
                let bracket = Bracket {
                    lo: alpha,
                    loss_lo: loss,
                    slope_lo: slope,
                    hi: alpha_prev,
                    loss_hi: loss_prev,
                };
                return self.zoom(objective, x, direction, loss0, slope0, bracket);
            }

            self.keep_gradient();
            alpha_prev = alpha;
            loss_prev = loss;
            slope_prev = slope;
            alpha *= 2.0;
        }

        // Expansion budget exhausted; every kept point satisfied sufficient decrease.
        (alpha_prev > 0.0).then_some(Step {
            alpha: alpha_prev,
            loss: loss_prev,
        })
    }

    fn zoom(
        &mut self,
        objective: &mut dyn Objective,
        x: &[f64],
        direction: &[f64],
        loss0: f64,
        slope0: f64,
        mut bracket: Bracket,
    ) -> Option<Step> {
        for _ in 0..MAX_LINE_SEARCH_STEPS {
            let alpha = bracket.interpolate();
            let (loss, slope) = self.phi(objective, x, direction, alpha);

            if !loss.is_finite() || loss > loss0 + C1 * alpha * slope0 || loss >= bracket.loss_lo {
                bracket.hi = alpha;
                bracket.loss_hi = sanitize(loss);
            } else {
                if slope.abs() <= -C2 * slope0 {
                    self.keep_gradient();
                    return Some(Step { alpha, loss });
                }
                if slope * (bracket.hi - bracket.lo) >= 0.0 {
                    bracket.hi = bracket.lo;
                    bracket.loss_hi = bracket.loss_lo;
                }
                bracket.lo = alpha;
                bracket.loss_lo = loss;
                bracket.slope_lo = slope;
                self.keep_gradient();
            }

            if (bracket.hi - bracket.lo).abs() <= f64::EPSILON * bracket.lo.abs().max(1.0) {
                break;
            }
        }

        // Fall back to the best sufficient-decrease point found, if any.
        (bracket.lo > 0.0 && bracket.loss_lo < loss0).then_some(Step {
            alpha: bracket.lo,
            loss: bracket.loss_lo,
        })
    }
}

fn sanitize(loss: f64) -> f64 {
    if loss.is_finite() {
        loss
    } else {
        f64::INFINITY
    }
}

/// Interval known to contain a strong-Wolfe step. `lo` has the lower loss
/// and satisfies sufficient decrease; `hi` may lie on either side of `lo`.
struct Bracket {
    lo: f64,
    loss_lo: f64,
    slope_lo: f64,
    hi: f64,
    loss_hi: f64,
}

impl Bracket {
    /// Minimizer of the quadratic through (lo, loss_lo, slope_lo) and (hi, loss_hi),
    /// kept at least 10% of the interval away from both ends; bisection otherwise.
    fn interpolate(&self) -> f64 {
        let width = self.hi - self.lo;
        let margin = 0.1 * width.abs();
        let lower = self.lo.min(self.hi) + margin;
        let upper = self.lo.max(self.hi) - margin;

        let curvature = self.loss_hi - self.loss_lo - self.slope_lo * width;
        if self.loss_hi.is_finite() && curvature > 0.0 {
            let candidate = self.lo - self.slope_lo * width * width / (2.0 * curvature);
            if candidate >= lower && candidate <= upper {
                return candidate;
            }
        }
        0.5 * (self.lo + self.hi)
    }
}
