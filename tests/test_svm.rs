//! Tests for the kernel SVM trainer and the regularization sweep
//!
//! - Linear and RBF kernels fit separable clusters
//! - Training accuracy does not fall as C grows on separable data
//! - Sweep points come back in C order with timings
//! - Seeded balanced sampling feeds the sweep

use rust_digit_classifiers::data::Split;
use rust_digit_classifiers::experiment::{balanced_sample, fit_and_score, sweep_regularization};
use rust_digit_classifiers::svm::{ClassifierTrainer, Kernel, KernelSvm, Scorer, SvmParams};
use rust_digit_classifiers::utils::{Matrix, SimpleRng};
use rust_digit_classifiers::ClassifierError;

const UNIT_SQUARE: [(f64, f64); 3] = [(0.1, 0.1), (0.9, 0.1), (0.5, 0.9)];
// Around the origin, so even a heavily regularized linear fit ranks classes correctly.
const CENTERED: [(f64, f64); 3] = [(-1.0, -1.0), (1.0, -1.0), (0.0, 1.2)];

fn clusters(seed: u64, per_class: usize) -> Split {
    clusters_at(seed, per_class, &UNIT_SQUARE)
}

// Three well separated clusters around `centers`.
fn clusters_at(seed: u64, per_class: usize, centers: &[(f64, f64)]) -> Split {
    let mut rng = SimpleRng::new(seed);
    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (class, &(cx, cy)) in centers.iter().enumerate() {
        for _ in 0..per_class {
            values.push(cx + rng.gen_range_f64(-0.08, 0.08));
            values.push(cy + rng.gen_range_f64(-0.08, 0.08));
            labels.push(class);
        }
    }
    let rows = labels.len();
    Split::new(Matrix::from_vec(rows, 2, values).unwrap(), labels).unwrap()
}

fn params(c: f64, kernel: Kernel) -> SvmParams {
    SvmParams {
        c,
        kernel,
        ..SvmParams::default()
    }
}

// ============================================================================
// Trainer Tests
// ============================================================================

mod trainer_tests {
    use super::*;

    #[test]
    fn test_linear_kernel_fits_clusters() {
        let train = clusters(1, 15);
        let test = clusters(2, 10);
        let model = KernelSvm::new(params(10.0, Kernel::Linear))
            .fit(&train.data, &train.labels)
            .unwrap();
        assert_eq!(model.score(&train.data, &train.labels).unwrap(), 1.0);
        assert_eq!(model.score(&test.data, &test.labels).unwrap(), 1.0);
        assert_eq!(model.num_classes(), 3);
    }

    #[test]
    fn test_rbf_kernel_fits_clusters() {
        let train = clusters(3, 15);
        let model = KernelSvm::new(params(1.0, Kernel::rbf(1.0)))
            .fit(&train.data, &train.labels)
            .unwrap();
        assert_eq!(model.score(&train.data, &train.labels).unwrap(), 1.0);
        assert_eq!(model.kernel(), Kernel::rbf(1.0));
    }

    #[test]
    fn test_predictions_are_valid_labels() {
        let train = clusters(4, 8);
        let model = KernelSvm::default().fit(&train.data, &train.labels).unwrap();
        let mut rng = SimpleRng::new(9);
        let queries = Matrix::from_vec(50, 2, (0..100).map(|_| rng.gen_range_f64(-1.0, 2.0)).collect()).unwrap();
        assert!(model.predict(&queries).unwrap().iter().all(|&label| label < 3));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let train = clusters(5, 10);
        let trainer = KernelSvm::new(params(1.0, Kernel::rbf_scaled()));
        let a = trainer.fit(&train.data, &train.labels).unwrap();
        let b = trainer.fit(&train.data, &train.labels).unwrap();
        assert_eq!(
            a.decision_function(&train.data).unwrap(),
            b.decision_function(&train.data).unwrap()
        );
    }

    #[test]
    fn test_empty_training_set_rejected() {
        let result = KernelSvm::default().fit(&Matrix::zeros(0, 2), &[]);
        assert!(matches!(result, Err(ClassifierError::EmptyInput(_))));
    }
}

// ============================================================================
// Sweep Tests
// ============================================================================

mod sweep_tests {
    use super::*;

    const C_VALUES: [f64; 5] = [0.01, 0.1, 1.0, 10.0, 100.0];

    #[test]
    fn test_training_accuracy_non_decreasing_in_c() {
        let train = clusters_at(6, 12, &CENTERED);
        let validation = clusters_at(7, 5, &CENTERED);
        let test = clusters_at(8, 5, &CENTERED);

        for kernel in [Kernel::Linear, Kernel::rbf(1.0)] {
            let points = sweep_regularization(
                &C_VALUES,
                |c| KernelSvm::new(params(c, kernel)),
                &train,
                &validation,
                &test,
            )
            .unwrap();

            for pair in points.windows(2) {
                assert!(
                    pair[1].train_accuracy >= pair[0].train_accuracy,
                    "{}: accuracy fell from C={} to C={}",
                    kernel.label(),
                    pair[0].c,
                    pair[1].c
                );
            }
            assert_eq!(points.last().unwrap().train_accuracy, 1.0);
        }
    }

    #[test]
    fn test_sweep_points_follow_c_order() {
        let train = clusters(9, 6);
        let points = sweep_regularization(
            &C_VALUES,
            |c| KernelSvm::new(params(c, Kernel::Linear)),
            &train,
            &train,
            &train,
        )
        .unwrap();

        let cs: Vec<f64> = points.iter().map(|p| p.c).collect();
        assert_eq!(cs, C_VALUES.to_vec());
        for p in &points {
            assert!(p.fit_seconds >= 0.0);
            for acc in [p.train_accuracy, p.validation_accuracy, p.test_accuracy] {
                assert!((0.0..=1.0).contains(&acc));
            }
        }
    }

    #[test]
    fn test_balanced_sample_feeds_fit() {
        let full = clusters(10, 30);
        let mut rng = SimpleRng::new(100);
        let sample = balanced_sample(&full, 10, 3, &mut rng);
        assert_eq!(sample.len(), 30);
        for class in 0..3 {
            assert_eq!(sample.indices_of_class(class).len(), 10);
        }

        let trainer = KernelSvm::new(params(1.0, Kernel::rbf_scaled()));
        let (accuracy, _) = fit_and_score(&trainer, &sample, &full, &full).unwrap();
        assert!(accuracy.test > 0.9);
    }
}
