//! Activation functions and decision helpers
//!
//! This module provides the probability primitives shared by the logistic
//! regression objectives and predictors:
//! - Sigmoid, evaluated without overflowing `exp` for large |z|
//! - Row-wise softmax with max-subtraction
//! - Probability clamping before logarithms
//! - First-occurrence arg-max per row

/// Lower bound applied to probabilities before taking a logarithm.
pub const PROB_EPSILON: f64 = 1e-15;

/// Sigmoid: 1 / (1 + exp(-z)).
///
/// For negative inputs the algebraically equal form exp(z) / (1 + exp(z)) is
/// used so that `exp` only ever sees non-positive arguments.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Sigmoid applied in-place.
pub fn sigmoid_inplace(data: &mut [f64]) {
    for value in data.iter_mut() {
        *value = sigmoid(*value);
    }
}

/// Clamp a probability into `[PROB_EPSILON, 1 - PROB_EPSILON]`.
///
/// Returns the clamped value and whether clamping changed it.
pub fn clamp_probability(p: f64) -> (f64, bool) {
    if p < PROB_EPSILON {
        (PROB_EPSILON, true)
    } else if p > 1.0 - PROB_EPSILON {
        (1.0 - PROB_EPSILON, true)
    } else {
        (p, false)
    }
}

/// Softmax applied row-wise, in-place.
///
/// Each row's maximum is subtracted before exponentiating so every `exp`
/// argument is non-positive; the row is then normalized by its own sum.
///
/// # Arguments
/// * `outputs` - Flat array containing row-major matrix data
/// * `rows` - Number of rows in the matrix
/// * `cols` - Number of columns in the matrix
pub fn softmax_rows(outputs: &mut [f64], rows: usize, cols: usize) {
    if cols == 0 {
        return;
    }
    assert_eq!(outputs.len(), rows * cols, "outputs length mismatch in softmax_rows");

    for row in outputs.chunks_exact_mut(cols).take(rows) {
        let mut max_value = row[0];
        for &value in row.iter().skip(1) {
            if value > max_value {
                max_value = value;
            }
        }

        let mut sum = 0.0f64;
        for value in row.iter_mut() {
            *value = (*value - max_value).exp();
            sum += *value;
        }

        let inv_sum = 1.0 / sum;
        for value in row.iter_mut() {
            *value *= inv_sum;
        }
    }
}

/// Index of the maximum value; ties resolve to the lowest index.
///
/// NaN entries never win a comparison. Returns 0 for an empty slice.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0usize;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &value) in values.iter().enumerate() {
        if value > best_value {
            best_value = value;
            best = i;
        }
    }
    best
}

/// Row-wise `argmax` over a row-major `rows × cols` buffer.
pub fn argmax_rows(values: &[f64], rows: usize, cols: usize) -> Vec<usize> {
    if cols == 0 {
        return vec![0; rows];
    }
    values.chunks_exact(cols).take(rows).map(argmax).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_sigmoid_zero() {
        assert!((sigmoid(0.0) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_sigmoid_symmetry() {
        for &z in &[0.3, 2.0, 17.5] {
            assert!((sigmoid(z) + sigmoid(-z) - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_sigmoid_extreme_inputs_are_finite() {
        assert_eq!(sigmoid(1e4), 1.0);
        assert_eq!(sigmoid(-1e4), 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_clamp_probability() {
        assert_eq!(clamp_probability(0.0), (PROB_EPSILON, true));
        assert_eq!(clamp_probability(1.0), (1.0 - PROB_EPSILON, true));
        assert_eq!(clamp_probability(0.25), (0.25, false));
    }

    #[test]
    fn test_softmax_uniform_input() {
        let mut data = vec![0.0; 3];
        softmax_rows(&mut data, 1, 3);
        for &val in &data {
            assert!((val - 1.0 / 3.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_softmax_numerical_stability() {
        let mut data = vec![1000.0, 1001.0, 1002.0, -1000.0, 0.0, 1000.0];
        softmax_rows(&mut data, 2, 3);
        for row in data.chunks_exact(3) {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < EPSILON);
        }
        assert!(!data.iter().any(|x| x.is_nan() || x.is_infinite()));
    }

    #[test]
    fn test_argmax_tie_lowest_index() {
        assert_eq!(argmax(&[0.0, 1.0, 3.0, 0.5, 0.0, 3.0]), 2);
    }

    #[test]
    fn test_argmax_rows() {
        let values = [0.1, 0.9, 0.5, 0.5];
        assert_eq!(argmax_rows(&values, 2, 2), vec![1, 0]);
    }
}
