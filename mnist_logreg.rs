use anyhow::{Context, Result};
use rust_digit_classifiers::config::{load_config, ExperimentConfig};
use rust_digit_classifiers::data::idx::load_mnist;
use rust_digit_classifiers::data::PreprocessedData;
use rust_digit_classifiers::experiment::{train_and_evaluate, EvaluationReport};
use rust_digit_classifiers::models::{ClassifierStrategy, Multinomial, OneVsRest};
use rust_digit_classifiers::report::{accuracy_line, write_json};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// One-vs-all and multinomial logistic regression on MNIST.
//
// Usage: mnist_logreg [config.json]
const RESULTS_FILE: &str = "logreg_results.json";

fn config_from_args(args: &[String]) -> Result<ExperimentConfig> {
    match args.get(1) {
        Some(path) => load_config(path).with_context(|| format!("failed to load config {path}")),
        None => Ok(ExperimentConfig::default()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn print_report(title: &str, report: &EvaluationReport) {
    println!("\n=== {title} ===");
    println!("{}", accuracy_line("Training", report.accuracy.train));
    println!("{}", accuracy_line("Validation", report.accuracy.validation));
    println!("{}", accuracy_line("Testing", report.accuracy.test));
    println!(
        "Fit time: {:.2} seconds ({} of {} runs converged)",
        report.fit_seconds,
        report.converged_runs,
        report.final_losses.len()
    );
}

// Fits both strategies on already preprocessed data.
fn evaluate_logistic_models(data: &PreprocessedData, config: &ExperimentConfig) -> Result<Vec<EvaluationReport>> {
    let strategies: [(&str, &dyn ClassifierStrategy); 2] = [
        ("One-vs-all logistic regression", &OneVsRest),
        ("Multinomial logistic regression", &Multinomial),
    ];

    let mut reports = Vec::with_capacity(strategies.len());
    for (title, strategy) in strategies {
        let mut minimizer = config.build_minimizer()?;
        let (_, report) = train_and_evaluate(strategy, data, minimizer.as_mut())
            .with_context(|| format!("{title} failed"))?;
        print_report(title, &report);
        reports.push(report);
    }
    Ok(reports)
}

fn results_path(config: &ExperimentConfig) -> PathBuf {
    Path::new(&config.output_dir).join(RESULTS_FILE)
}

fn run(config: &ExperimentConfig) -> Result<()> {
    println!("Loading MNIST from {}...", config.data_dir);
    let load_start = Instant::now();
    let raw = load_mnist(Path::new(&config.data_dir))
        .with_context(|| format!("failed to load MNIST from {}", config.data_dir))?;
    let data = config.preprocessor().run(&raw)?;
    println!(
        "Preprocessing done in {:.2} seconds: {} features kept of {}",
        load_start.elapsed().as_secs_f64(),
        data.num_features(),
        data.mask.original_features()
    );

    let reports = evaluate_logistic_models(&data, config)?;

    let path = results_path(config);
    write_json(&path, &reports).with_context(|| format!("failed to write {}", path.display()))?;
    println!("\nResults written to {}", path.display());
    Ok(())
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
