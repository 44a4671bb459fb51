//! Shared utilities for the classifiers
//!
//! This module provides the dense matrix type with GEMM, the probability
//! activations used by the logistic regression models, and random number
//! generation for reproducible sampling.

pub mod activations;
pub mod matrix;
pub mod rng;

pub use activations::{argmax, argmax_rows, clamp_probability, sigmoid, softmax_rows};
pub use matrix::{gemm, Matrix};
pub use rng::SimpleRng;
