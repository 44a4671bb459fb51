use anyhow::{Context, Result};
use rust_digit_classifiers::config::{load_config, ExperimentConfig};
use rust_digit_classifiers::data::idx::load_mnist;
use rust_digit_classifiers::data::PreprocessedData;
use rust_digit_classifiers::experiment::{
    balanced_sample, fit_and_score, sweep_regularization, SplitAccuracy, SweepPoint,
};
use rust_digit_classifiers::report::{accuracy_line, sweep_table, write_json, write_sweep_csv};
use rust_digit_classifiers::svm::{Kernel, KernelSvm};
use rust_digit_classifiers::utils::SimpleRng;
use serde::Serialize;
use std::env;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// Kernel SVM comparisons and the C sweep on a class-balanced MNIST sample.
//
// Usage: mnist_svm [config.json]
const SWEEP_CSV: &str = "svm_sweep.csv";
const RESULTS_FILE: &str = "svm_results.json";

#[derive(Debug, Serialize)]
struct Comparison {
    kernel: String,
    c: f64,
    accuracy: SplitAccuracy,
    fit_seconds: f64,
}

#[derive(Debug, Serialize)]
struct SvmSummary {
    samples: usize,
    comparisons: Vec<Comparison>,
    sweep_kernel: String,
    sweep: Vec<SweepPoint>,
}

fn config_from_args(args: &[String]) -> Result<ExperimentConfig> {
    match args.get(1) {
        Some(path) => load_config(path).with_context(|| format!("failed to load config {path}")),
        None => Ok(ExperimentConfig::default()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run_svm_experiments(data: &PreprocessedData, config: &ExperimentConfig) -> Result<SvmSummary> {
    let svm = &config.svm;
    let mut rng = SimpleRng::new(svm.seed);
    let train = balanced_sample(&data.train, svm.samples_per_class, data.num_classes, &mut rng);
    println!("Sampled {} training rows ({} per class)", train.len(), svm.samples_per_class);

    let kernels = [Kernel::Linear, Kernel::rbf_scaled(), Kernel::rbf(1.0)];
    let mut comparisons = Vec::with_capacity(kernels.len());
    for kernel in kernels {
        let trainer = KernelSvm::new(svm.params(1.0, kernel));
        let (accuracy, fit_seconds) = fit_and_score(&trainer, &train, &data.validation, &data.test)
            .with_context(|| format!("svm with {} kernel failed", kernel.label()))?;

        println!("\n=== SVM, {} kernel, C = 1 ===", kernel.label());
        println!("{}", accuracy_line("Training", accuracy.train));
        println!("{}", accuracy_line("Validation", accuracy.validation));
        println!("{}", accuracy_line("Testing", accuracy.test));
        println!("Fit time: {fit_seconds:.2} seconds");

        comparisons.push(Comparison {
            kernel: kernel.label(),
            c: 1.0,
            accuracy,
            fit_seconds,
        });
    }

    let sweep_kernel = svm.sweep_kernel();
    println!("\n=== C sweep, {} kernel ===", sweep_kernel.label());
    let sweep = sweep_regularization(
        &svm.c_values,
        |c| KernelSvm::new(svm.params(c, sweep_kernel)),
        &train,
        &data.validation,
        &data.test,
    )?;
    print!("{}", sweep_table(&sweep));

    Ok(SvmSummary {
        samples: train.len(),
        comparisons,
        sweep_kernel: sweep_kernel.label(),
        sweep,
    })
}

fn write_outputs(summary: &SvmSummary, output_dir: &Path) -> Result<()> {
    let csv = output_dir.join(SWEEP_CSV);
    write_sweep_csv(&csv, &summary.sweep).with_context(|| format!("failed to write {}", csv.display()))?;
    let json = output_dir.join(RESULTS_FILE);
    write_json(&json, summary).with_context(|| format!("failed to write {}", json.display()))?;
    println!("\nSweep written to {} and {}", csv.display(), json.display());
    Ok(())
}

fn run(config: &ExperimentConfig) -> Result<()> {
    println!("Loading MNIST from {}...", config.data_dir);
    let raw = load_mnist(Path::new(&config.data_dir))
        .with_context(|| format!("failed to load MNIST from {}", config.data_dir))?;
    let data = config.preprocessor().run(&raw)?;

    let summary = run_svm_experiments(&data, config)?;
    write_outputs(&summary, Path::new(&config.output_dir))
}

fn main() -> Result<()> {
    let program_start = Instant::now();
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let config = config_from_args(&args)?;
    run(&config)?;

    println!(
        "Total time: {:.2} seconds",
        program_start.elapsed().as_secs_f64()
    );
    Ok(())
}
