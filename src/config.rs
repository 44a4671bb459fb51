//! Configuration structures for experiments
//!
//! This module provides the JSON-backed experiment configuration: data paths,
//! preprocessing constants, minimizer settings and the SVM sweep parameters.
//! Every field has a default, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;

use crate::data::preprocess::{DEFAULT_STD_THRESHOLD, DEFAULT_VALIDATION_PER_CLASS, PIXEL_SCALE};
use crate::data::Preprocessor;
use crate::error::{ClassifierError, Result};
use crate::optimizers::{ConjugateGradient, GradientDescent, Minimizer};
use crate::svm::{Kernel, SvmParams};

/// Minimizer names accepted by `minimizer`.
pub const VALID_MINIMIZERS: [&str; 2] = ["conjugate_gradient", "gradient_descent"];

/// Configuration for a full experiment run.
///
/// # Example
///
/// ```json
/// {
///   "data_dir": "./data",
///   "n_validation": 1000,
///   "max_iterations": 100,
///   "minimizer": "conjugate_gradient",
///   "svm": { "samples_per_class": 1000, "c_values": [1, 10, 100] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Directory holding the four IDX files.
    pub data_dir: String,

    /// Directory for JSON/CSV reports.
    pub output_dir: String,

    /// Validation rows reserved from each class's training block.
    pub n_validation: usize,

    /// Columns whose training std-dev does not exceed this are dropped.
    pub std_threshold: f64,

    /// Divisor applied to retained pixel values.
    pub pixel_scale: f64,

    /// Iteration budget per minimization.
    pub max_iterations: usize,

    /// "conjugate_gradient" or "gradient_descent"
    pub minimizer: String,

    /// Step size, gradient descent only.
    pub learning_rate: f64,

    /// Stop when the gradient infinity norm falls to this value.
    pub gradient_tolerance: f64,

    pub svm: SvmConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            output_dir: "./logs".to_string(),
            n_validation: DEFAULT_VALIDATION_PER_CLASS,
            std_threshold: DEFAULT_STD_THRESHOLD,
            pixel_scale: PIXEL_SCALE,
            max_iterations: 100,
            minimizer: "conjugate_gradient".to_string(),
            learning_rate: 0.5,
            gradient_tolerance: 1e-5,
            svm: SvmConfig::default(),
        }
    }
}

/// Kernel SVM sampling and sweep settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Training rows sampled from each class.
    pub samples_per_class: usize,

    /// Seed for the class-balanced sample shuffle.
    pub seed: u64,

    /// Regularization strengths swept with the RBF kernel.
    pub c_values: Vec<f64>,

    /// RBF width; `None` uses 1 / (D * Var(X)).
    pub gamma: Option<f64>,

    /// Dual coordinate descent stopping tolerance.
    pub tolerance: f64,

    /// Passes over the training set per one-vs-rest problem.
    pub max_epochs: usize,
}

impl Default for SvmConfig {
    fn default() -> Self {
        let mut c_values = vec![1.0];
        c_values.extend((1..=10u32).map(|i| f64::from(i) * 10.0));
        Self {
            samples_per_class: 1000,
            seed: 100,
            c_values,
            gamma: None,
            tolerance: 1e-3,
            max_epochs: 200,
        }
    }
}

impl ExperimentConfig {
    /// Preprocessor built from the preprocessing fields.
    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor::new(self.n_validation)
            .with_std_threshold(self.std_threshold)
            .with_pixel_scale(self.pixel_scale)
    }

    /// Minimizer selected by `minimizer`.
    pub fn build_minimizer(&self) -> Result<Box<dyn Minimizer>> {
        match self.minimizer.as_str() {
            "conjugate_gradient" => Ok(Box::new(
                ConjugateGradient::new(self.max_iterations)
                    .with_gradient_tolerance(self.gradient_tolerance),
            )),
            "gradient_descent" => Ok(Box::new(
                GradientDescent::new(self.learning_rate, self.max_iterations)
                    .with_gradient_tolerance(self.gradient_tolerance),
            )),
            other => Err(invalid_minimizer(other)),
        }
    }
}

impl SvmConfig {
    /// SVM parameters for regularization strength `c` and `kernel`.
    pub fn params(&self, c: f64, kernel: Kernel) -> SvmParams {
        SvmParams {
            c,
            kernel,
            tolerance: self.tolerance,
            max_epochs: self.max_epochs,
            seed: self.seed,
        }
    }

    /// RBF kernel using the configured gamma, or the scale heuristic when unset.
    pub fn sweep_kernel(&self) -> Kernel {
        Kernel::Rbf { gamma: self.gamma }
    }
}

/// Loads an experiment configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it into an `ExperimentConfig` and
/// validates it.
///
/// # Examples
///
/// ```no_run
/// use rust_digit_classifiers::config::load_config;
///
/// let cfg = load_config("config/mnist_logreg.json").unwrap();
/// assert_eq!(cfg.minimizer, "conjugate_gradient");
/// ```
pub fn load_config(path: &str) -> Result<ExperimentConfig> {
    let contents = fs::read_to_string(path)?;
    let config: ExperimentConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> ClassifierError {
    ClassifierError::InvalidConfig(message.into())
}

fn invalid_minimizer(name: &str) -> ClassifierError {
    invalid(format!(
        "Invalid minimizer '{}'. Must be one of: {}",
        name,
        VALID_MINIMIZERS.join(", ")
    ))
}

/// Reject values the pipeline cannot run with.
pub fn validate_config(config: &ExperimentConfig) -> Result<()> {
    if config.n_validation == 0 {
        return Err(invalid("n_validation must be at least 1"));
    }

    if !(config.std_threshold >= 0.0) {
        return Err(invalid("std_threshold must be non-negative"));
    }

    if !(config.pixel_scale > 0.0) {
        return Err(invalid("pixel_scale must be positive"));
    }

    if !VALID_MINIMIZERS.contains(&config.minimizer.as_str()) {
        return Err(invalid_minimizer(&config.minimizer));
    }

    if config.minimizer == "gradient_descent" && !(config.learning_rate > 0.0) {
        return Err(invalid("learning_rate must be positive"));
    }

    if !(config.gradient_tolerance >= 0.0) {
        return Err(invalid("gradient_tolerance must be non-negative"));
    }

    let svm = &config.svm;
    if svm.samples_per_class == 0 {
        return Err(invalid("svm.samples_per_class must be at least 1"));
    }

    if svm.c_values.is_empty() {
        return Err(invalid("svm.c_values must not be empty"));
    }

    if let Some(c) = svm.c_values.iter().find(|c| !(**c > 0.0)) {
        return Err(invalid(format!("svm.c_values must be positive, got {c}")));
    }

    if let Some(gamma) = svm.gamma {
        if !(gamma > 0.0) {
            return Err(invalid("svm.gamma must be positive"));
        }
    }

    if !(svm.tolerance > 0.0) {
        return Err(invalid("svm.tolerance must be positive"));
    }

    if svm.max_epochs == 0 {
        return Err(invalid("svm.max_epochs must be at least 1"));
    }

    Ok(())
}
