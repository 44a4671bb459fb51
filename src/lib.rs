//! Rust Digit Classifiers Library
//!
//! Linear and kernel classifiers for handwritten digit images: feature
//! preprocessing, one-vs-all and multinomial logistic regression objectives
//! with their predictors, a gradient-based minimizer, a kernel SVM trainer and
//! the driver that fits, scores and sweeps them.
//!
//! # Modules
//!
//! - `data`: per-class raw blocks, the feature preprocessor, the IDX loader
//! - `models`: logistic regression objectives, predictors and training strategies
//! - `optimizers`: Objective/Minimizer traits, conjugate gradient, gradient descent
//! - `svm`: trainer/scorer traits and the kernel SVM
//! - `experiment`: fit/evaluate driver and the regularization sweep
//! - `report`: CSV/JSON output for external plotting
//! - `utils`: matrix type, GEMM, activations, RNG
//! - `config`: experiment configuration
//! - `error`: error taxonomy

#[cfg(feature = "blas")]
extern crate blas_src;

pub mod config;
pub mod data;
pub mod error;
pub mod experiment;
pub mod models;
pub mod optimizers;
pub mod report;
pub mod svm;
pub mod utils;

pub use error::{ClassifierError, Result};
