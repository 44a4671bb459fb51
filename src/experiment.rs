//! Training and evaluation driver
//!
//! Fits a logistic strategy with a minimizer and scores it on all three
//! splits, draws the class-balanced SVM training sample, and sweeps the SVM
//! regularization strength. Every run returns its results as values; nothing
//! is accumulated across calls.

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::data::{PreprocessedData, Split};
use crate::error::{ClassifierError, Result};
use crate::models::{ClassifierStrategy, FittedModel};
use crate::optimizers::Minimizer;
use crate::svm::{ClassifierTrainer, Scorer};
use crate::utils::{Matrix, SimpleRng};

/// Fraction of positions where `predicted` equals `truth`.
///
/// # Errors
///
/// `DimensionMismatch` for different lengths, `EmptyInput` for no samples.
pub fn accuracy(predicted: &[usize], truth: &[usize]) -> Result<f64> {
    if predicted.len() != truth.len() {
        return Err(ClassifierError::dimension(truth.len(), predicted.len()));
    }
    if truth.is_empty() {
        return Err(ClassifierError::EmptyInput("no samples to score".to_string()));
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Accuracy on each split, in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitAccuracy {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

/// Summary of one logistic strategy run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub strategy: String,
    pub minimizer: String,
    pub accuracy: SplitAccuracy,
    pub fit_seconds: f64,
    pub final_losses: Vec<f64>,
    /// Minimizer runs that met the gradient tolerance, out of `final_losses.len()`.
    pub converged_runs: usize,
}

/// Score frozen weights on the three splits.
pub fn evaluate_weights(
    strategy: &dyn ClassifierStrategy,
    weights: &Matrix,
    data: &PreprocessedData,
) -> Result<SplitAccuracy> {
    let score = |split: &Split| -> Result<f64> {
        let predicted = strategy.predict(weights, &split.data)?;
        accuracy(&predicted, &split.labels)
    };
    Ok(SplitAccuracy {
        train: score(&data.train)?,
        validation: score(&data.validation)?,
        test: score(&data.test)?,
    })
}

/// Fit `strategy` on the training split and score it on all three splits.
pub fn train_and_evaluate(
    strategy: &dyn ClassifierStrategy,
    data: &PreprocessedData,
    minimizer: &mut dyn Minimizer,
) -> Result<(FittedModel, EvaluationReport)> {
    info!(
        strategy = strategy.name(),
        minimizer = minimizer.name(),
        samples = data.train.len(),
        features = data.num_features(),
        "training"
    );

    let start = Instant::now();
    let model = strategy.fit(&data.train, data.num_classes, minimizer)?;
    let fit_seconds = start.elapsed().as_secs_f64();

    let accuracy = evaluate_weights(strategy, &model.weights, data)?;
    info!(
        strategy = strategy.name(),
        train = accuracy.train,
        validation = accuracy.validation,
        test = accuracy.test,
        fit_seconds,
        "evaluated"
    );

    let report = EvaluationReport {
        strategy: strategy.name().to_string(),
        minimizer: minimizer.name().to_string(),
        accuracy,
        fit_seconds,
        final_losses: model.final_losses(),
        converged_runs: model.converged_runs(),
    };
    Ok((model, report))
}

/// Up to `per_class` seeded-random rows of every class in `0..num_classes`,
/// then the combined sample shuffled with the same generator.
pub fn balanced_sample(split: &Split, per_class: usize, num_classes: usize, rng: &mut SimpleRng) -> Split {
    let mut indices = Vec::with_capacity(per_class * num_classes);
    for class in 0..num_classes {
        let mut members = split.indices_of_class(class);
        rng.shuffle(&mut members);
        members.truncate(per_class);
        indices.extend(members);
    }
    rng.shuffle(&mut indices);
    split.subset(&indices)
}

/// Fit once and score on the three splits, timing only the fit.
pub fn fit_and_score<T: ClassifierTrainer>(
    trainer: &T,
    train: &Split,
    validation: &Split,
    test: &Split,
) -> Result<(SplitAccuracy, f64)> {
    let start = Instant::now();
    let model = trainer.fit(&train.data, &train.labels)?;
    let fit_seconds = start.elapsed().as_secs_f64();

    let accuracy = SplitAccuracy {
        train: model.score(&train.data, &train.labels)?,
        validation: model.score(&validation.data, &validation.labels)?,
        test: model.score(&test.data, &test.labels)?,
    };
    Ok((accuracy, fit_seconds))
}

/// One regularization-strength point of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    pub c: f64,
    pub train_accuracy: f64,
    pub validation_accuracy: f64,
    pub test_accuracy: f64,
    pub fit_seconds: f64,
}

/// Fit `make_trainer(c)` for every `c`, in order, and collect one point each.
pub fn sweep_regularization<T, F>(
    c_values: &[f64],
    make_trainer: F,
    train: &Split,
    validation: &Split,
    test: &Split,
) -> Result<Vec<SweepPoint>>
where
    T: ClassifierTrainer,
    F: Fn(f64) -> T,
{
    let mut points = Vec::with_capacity(c_values.len());
    for &c in c_values {
        let trainer = make_trainer(c);
        let (accuracy, fit_seconds) = fit_and_score(&trainer, train, validation, test)?;
        info!(
            c,
            train = accuracy.train,
            validation = accuracy.validation,
            test = accuracy.test,
            fit_seconds,
            "sweep point"
        );
        points.push(SweepPoint {
            c,
            train_accuracy: accuracy.train,
            validation_accuracy: accuracy.validation,
            test_accuracy: accuracy.test,
            fit_seconds,
        });
    }
    Ok(points)
}
