//! Tests for experiment configuration parsing
//!
//! This file tests the config module including:
//! - Loading the shipped JSON config files
//! - Defaults for missing fields
//! - Rejecting invalid values
//! - Handling invalid JSON and missing files

use rust_digit_classifiers::config::{load_config, validate_config, ExperimentConfig};
use rust_digit_classifiers::svm::Kernel;
use rust_digit_classifiers::ClassifierError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp config");
    file
}

fn load_str(contents: &str) -> Result<ExperimentConfig, ClassifierError> {
    let file = write_temp_config(contents);
    load_config(file.path().to_str().unwrap())
}

// ============================================================================
// Shipped Config Tests
// ============================================================================

mod shipped_config_tests {
    use super::*;

    #[test]
    fn test_load_logreg_config() {
        let config = load_config("config/mnist_logreg.json").expect("Failed to load logreg config");
        assert_eq!(config.minimizer, "conjugate_gradient");
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.n_validation, 1000);
        assert_eq!(config.std_threshold, 0.001);
    }

    #[test]
    fn test_load_gradient_descent_config() {
        let config = load_config("config/mnist_logreg_gd.json").expect("Failed to load gd config");
        assert_eq!(config.minimizer, "gradient_descent");
        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.build_minimizer().unwrap().max_iterations(), 300);
    }

    #[test]
    fn test_load_svm_config() {
        let config = load_config("config/mnist_svm.json").expect("Failed to load svm config");
        assert_eq!(config.svm.samples_per_class, 1000);
        assert_eq!(config.svm.seed, 100);
        assert_eq!(config.svm.c_values.len(), 11);
        assert_eq!(config.svm.gamma, None);
        assert_eq!(config.svm.sweep_kernel(), Kernel::rbf_scaled());
    }

    #[test]
    fn test_load_quick_svm_config() {
        let config = load_config("config/mnist_svm_quick.json").expect("Failed to load quick config");
        assert_eq!(config.svm.c_values, vec![1.0, 10.0, 100.0]);
        assert_eq!(config.svm.sweep_kernel(), Kernel::rbf(0.05));
        // Fields outside "svm" keep their defaults.
        assert_eq!(config.data_dir, "./data");
    }
}

// ============================================================================
// Defaults Tests
// ============================================================================

mod defaults_tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(load_str("{}").unwrap(), ExperimentConfig::default());
    }

    #[test]
    fn test_partial_svm_section() {
        let config = load_str(r#"{ "svm": { "seed": 7 } }"#).unwrap();
        assert_eq!(config.svm.seed, 7);
        assert_eq!(config.svm.samples_per_class, 1000);
        assert_eq!(config.svm.max_epochs, 200);
    }

    #[test]
    fn test_preprocessor_from_config() {
        let config = load_str(r#"{ "n_validation": 5 }"#).unwrap();
        assert_eq!(config.preprocessor().n_validation(), 5);
    }

    #[test]
    fn test_svm_params_from_config() {
        let config = load_str(r#"{ "svm": { "tolerance": 0.01, "max_epochs": 50 } }"#).unwrap();
        let params = config.svm.params(3.0, Kernel::Linear);
        assert_eq!(params.c, 3.0);
        assert_eq!(params.tolerance, 0.01);
        assert_eq!(params.max_epochs, 50);
        assert_eq!(params.seed, 100);
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

mod validation_tests {
    use super::*;

    fn assert_invalid(contents: &str) {
        let result = load_str(contents);
        assert!(
            matches!(result, Err(ClassifierError::InvalidConfig(_))),
            "expected InvalidConfig for {contents}, got {result:?}"
        );
    }

    #[test]
    fn test_unknown_minimizer() {
        assert_invalid(r#"{ "minimizer": "newton" }"#);
    }

    #[test]
    fn test_negative_threshold() {
        assert_invalid(r#"{ "std_threshold": -0.1 }"#);
    }

    #[test]
    fn test_zero_validation_rows() {
        assert_invalid(r#"{ "n_validation": 0 }"#);
    }

    #[test]
    fn test_zero_pixel_scale() {
        assert_invalid(r#"{ "pixel_scale": 0 }"#);
    }

    #[test]
    fn test_non_positive_learning_rate_for_gd() {
        assert_invalid(r#"{ "minimizer": "gradient_descent", "learning_rate": 0 }"#);
    }

    #[test]
    fn test_empty_c_values() {
        assert_invalid(r#"{ "svm": { "c_values": [] } }"#);
    }

    #[test]
    fn test_non_positive_c_value() {
        assert_invalid(r#"{ "svm": { "c_values": [1, 0, 10] } }"#);
    }

    #[test]
    fn test_zero_samples_per_class() {
        assert_invalid(r#"{ "svm": { "samples_per_class": 0 } }"#);
    }

    #[test]
    fn test_non_positive_gamma() {
        assert_invalid(r#"{ "svm": { "gamma": -1.0 } }"#);
    }

    #[test]
    fn test_validate_config_directly() {
        let mut config = ExperimentConfig::default();
        assert!(validate_config(&config).is_ok());
        config.svm.max_epochs = 0;
        assert!(validate_config(&config).is_err());
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_invalid_json() {
        assert!(matches!(load_str("{ not json"), Err(ClassifierError::Json(_))));
    }

    #[test]
    fn test_wrong_field_type() {
        assert!(matches!(
            load_str(r#"{ "max_iterations": "many" }"#),
            Err(ClassifierError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("config/does_not_exist.json"),
            Err(ClassifierError::Io(_))
        ));
    }
}
