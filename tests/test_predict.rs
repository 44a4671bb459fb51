//! Tests for the binary and multinomial predictors
//!
//! - Predicted labels always lie in [0, K)
//! - Arg-max ties resolve to the lowest class index
//! - Predictors reject weight matrices without a bias row

use rust_digit_classifiers::models::multinomial::multinomial_probabilities;
use rust_digit_classifiers::models::{predict_binary, predict_multinomial};
use rust_digit_classifiers::utils::{Matrix, SimpleRng};
use rust_digit_classifiers::ClassifierError;

fn random_matrix(rng: &mut SimpleRng, rows: usize, cols: usize, scale: f64) -> Matrix {
    let values = (0..rows * cols).map(|_| rng.gen_range_f64(-scale, scale)).collect();
    Matrix::from_vec(rows, cols, values).unwrap()
}

// Weights whose only non-zero entries are the biases, so every row gets the same scores.
fn bias_only_weights(features: usize, biases: &[f64]) -> Matrix {
    let mut weights = Matrix::zeros(features + 1, biases.len());
    for (k, &b) in biases.iter().enumerate() {
        weights.set(0, k, b);
    }
    weights
}

// ============================================================================
// Label Range Tests
// ============================================================================

mod label_range_tests {
    use super::*;

    #[test]
    fn test_labels_in_range_for_random_inputs() {
        let mut rng = SimpleRng::new(2024);
        for &(n, d, k) in &[(1, 1, 2), (17, 5, 10), (40, 12, 3)] {
            let data = random_matrix(&mut rng, n, d, 1.0);
            let weights = random_matrix(&mut rng, d + 1, k, 50.0);

            let binary = predict_binary(&weights, &data).unwrap();
            let multinomial = predict_multinomial(&weights, &data).unwrap();
            assert_eq!(binary.len(), n);
            assert_eq!(multinomial.len(), n);
            assert!(binary.iter().all(|&label| label < k));
            assert!(multinomial.iter().all(|&label| label < k));
        }
    }

    #[test]
    fn test_empty_data_gives_no_labels() {
        let weights = Matrix::zeros(4, 10);
        let data = Matrix::zeros(0, 3);
        assert!(predict_binary(&weights, &data).unwrap().is_empty());
        assert!(predict_multinomial(&weights, &data).unwrap().is_empty());
    }

    #[test]
    fn test_missing_bias_row_rejected() {
        let weights = Matrix::zeros(3, 10);
        let data = Matrix::zeros(2, 3);
        assert!(matches!(
            predict_binary(&weights, &data),
            Err(ClassifierError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            predict_multinomial(&weights, &data),
            Err(ClassifierError::DimensionMismatch { .. })
        ));
    }
}

// ============================================================================
// Tie-Break Tests
// ============================================================================

mod tie_break_tests {
    use super::*;

    const TIED: [f64; 7] = [0.0, 1.0, 3.0, -2.0, 0.5, 3.0, 2.9];

    #[test]
    fn test_binary_tie_picks_lowest_index() {
        let weights = bias_only_weights(2, &TIED);
        let data = Matrix::from_rows(&[vec![0.3, 0.7], vec![1.0, 0.0]]).unwrap();
        assert_eq!(predict_binary(&weights, &data).unwrap(), vec![2, 2]);
    }

    #[test]
    fn test_multinomial_tie_picks_lowest_index() {
        let weights = bias_only_weights(2, &TIED);
        let data = Matrix::from_rows(&[vec![0.3, 0.7], vec![1.0, 0.0]]).unwrap();
        assert_eq!(predict_multinomial(&weights, &data).unwrap(), vec![2, 2]);
    }

    #[test]
    fn test_saturated_sigmoids_tie_on_lowest_index() {
        let weights = bias_only_weights(1, &[40.0, 50.0]);
        let data = Matrix::from_rows(&[vec![0.5]]).unwrap();
        assert_eq!(predict_binary(&weights, &data).unwrap(), vec![0]);
        // Softmax keeps the logit gap, so the joint model still separates them.
        assert_eq!(predict_multinomial(&weights, &data).unwrap(), vec![1]);
    }

    #[test]
    fn test_all_equal_scores_pick_class_zero() {
        let weights = Matrix::zeros(3, 10);
        let data = Matrix::from_rows(&[vec![0.2, 0.9]]).unwrap();
        assert_eq!(predict_binary(&weights, &data).unwrap(), vec![0]);
        assert_eq!(predict_multinomial(&weights, &data).unwrap(), vec![0]);
    }
}

// ============================================================================
// Probability Tests
// ============================================================================

mod probability_tests {
    use super::*;

    #[test]
    fn test_multinomial_rows_are_distributions() {
        let mut rng = SimpleRng::new(77);
        let data = random_matrix(&mut rng, 25, 4, 1.0);
        let weights = random_matrix(&mut rng, 5, 10, 30.0);
        let probs = multinomial_probabilities(&weights, &data).unwrap();

        for r in 0..probs.rows() {
            let row = probs.row(r);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_binary_and_multinomial_agree_on_bias_only_weights() {
        let weights = bias_only_weights(1, &[-1.0, 4.0, 0.5]);
        let data = Matrix::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        assert_eq!(predict_binary(&weights, &data).unwrap(), vec![1, 1]);
        assert_eq!(predict_multinomial(&weights, &data).unwrap(), vec![1, 1]);
    }
}
