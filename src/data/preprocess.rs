//! Feature preprocessing
//!
//! Converts per-class raw blocks into train/validation/test splits:
//! 1. The first `n_validation` rows of each class's training block become that
//!    class's validation samples; the remaining rows are training samples.
//!    Test blocks are used as-is.
//! 2. Rows are concatenated class by class; a row's label is its class index.
//! 3. Columns whose population standard deviation over the assembled training
//!    matrix does not exceed `std_threshold` are dropped from all three splits.
//! 4. Retained values are divided by `pixel_scale` (255), giving features in [0, 1].

use tracing::info;

use super::{ClassBlock, RawDataset, Split};
use crate::error::{ClassifierError, Result};
use crate::utils::Matrix;

/// Validation rows reserved from each class's training block.
pub const DEFAULT_VALIDATION_PER_CLASS: usize = 1000;
/// Columns with training std-dev at or below this value are dropped.
pub const DEFAULT_STD_THRESHOLD: f64 = 0.001;
/// Maximum pixel intensity.
pub const PIXEL_SCALE: f64 = 255.0;

/// Column indices retained after near-constant feature removal.
///
/// Derived from training data once and applied unchanged to every split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureMask {
    retained: Vec<usize>,
    original_features: usize,
}

impl FeatureMask {
    /// Keep every column whose standard deviation is strictly above `threshold`.
    pub fn from_std(std: &[f64], threshold: f64) -> Self {
        let retained = std
            .iter()
            .enumerate()
            .filter(|(_, &sigma)| sigma > threshold)
            .map(|(i, _)| i)
            .collect();
        Self {
            retained,
            original_features: std.len(),
        }
    }

    /// Retained column indices in ascending order.
    pub fn retained(&self) -> &[usize] {
        &self.retained
    }

    /// Dropped column indices in ascending order.
    pub fn dropped(&self) -> Vec<usize> {
        let mut keep = self.retained.iter().peekable();
        (0..self.original_features)
            .filter(|i| {
                if keep.peek() == Some(&i) {
                    keep.next();
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Number of retained columns.
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    pub fn original_features(&self) -> usize {
        self.original_features
    }

    /// Select the retained columns of `data`.
    pub fn apply(&self, data: &Matrix) -> Result<Matrix> {
        if data.cols() != self.original_features {
            return Err(ClassifierError::dimension(self.original_features, data.cols()));
        }
        Ok(data.select_columns(&self.retained))
    }
}

/// Output of the preprocessor.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedData {
    pub train: Split,
    pub validation: Split,
    pub test: Split,
    pub mask: FeatureMask,
    pub num_classes: usize,
}

impl PreprocessedData {
    /// Feature count D after filtering.
    pub fn num_features(&self) -> usize {
        self.mask.len()
    }
}

/// Feature preprocessor settings.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    n_validation: usize,
    std_threshold: f64,
    pixel_scale: f64,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            n_validation: DEFAULT_VALIDATION_PER_CLASS,
            std_threshold: DEFAULT_STD_THRESHOLD,
            pixel_scale: PIXEL_SCALE,
        }
    }
}

impl Preprocessor {
    /// Preprocessor reserving `n_validation` rows per class, default threshold and scale.
    pub fn new(n_validation: usize) -> Self {
        Self {
            n_validation,
            ..Self::default()
        }
    }

    pub fn with_std_threshold(mut self, threshold: f64) -> Self {
        self.std_threshold = threshold;
        self
    }

    pub fn with_pixel_scale(mut self, scale: f64) -> Self {
        self.pixel_scale = scale;
        self
    }

    pub fn n_validation(&self) -> usize {
        self.n_validation
    }

    /// Build the three splits from `raw`.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if `n_validation` is zero, a training block has fewer
    /// rows than `n_validation`, or no training rows remain after the
    /// validation reservation.
    pub fn run<const K: usize>(&self, raw: &RawDataset<K>) -> Result<PreprocessedData> {
        if self.n_validation == 0 {
            return Err(ClassifierError::MalformedInput(
                "at least one validation row per class is required".to_string(),
            ));
        }
        let n_features = raw.num_features();

        for (class, block) in raw.train_blocks().iter().enumerate() {
            if block.rows() < self.n_validation {
                return Err(ClassifierError::MalformedInput(format!(
                    "training block for class {class} has {} rows, fewer than the {} reserved for validation",
                    block.rows(),
                    self.n_validation
                )));
            }
        }

        let mut train = Assembler::new(n_features);
        let mut validation = Assembler::new(n_features);
        let mut test = Assembler::new(n_features);

        for class in 0..K {
            let block = raw.train_block(class);
            validation.push_rows(block, 0..self.n_validation, class);
            train.push_rows(block, self.n_validation..block.rows(), class);
            let block = raw.test_block(class);
            test.push_rows(block, 0..block.rows(), class);
        }

        if train.labels.is_empty() {
            return Err(ClassifierError::MalformedInput(
                "no training rows remain after the validation reservation".to_string(),
            ));
        }

        let train = train.finish()?;
        let validation = validation.finish()?;
        let test = test.finish()?;

        let mask = FeatureMask::from_std(&train.data.column_std(), self.std_threshold);

        let train = self.filter_and_scale(&mask, train)?;
        let validation = self.filter_and_scale(&mask, validation)?;
        let test = self.filter_and_scale(&mask, test)?;

        info!(
            train = train.len(),
            validation = validation.len(),
            test = test.len(),
            features = mask.len(),
            dropped = n_features - mask.len(),
            "preprocessing complete"
        );

        Ok(PreprocessedData {
            train,
            validation,
            test,
            mask,
            num_classes: K,
        })
    }

    fn filter_and_scale(&self, mask: &FeatureMask, split: Split) -> Result<Split> {
        let mut data = mask.apply(&split.data)?;
        for value in data.as_mut_slice() {
            *value /= self.pixel_scale;
        }
        Split::new(data, split.labels)
    }
}

/// Accumulates rows from several class blocks into one row-major buffer.
struct Assembler {
    cols: usize,
    values: Vec<f64>,
    labels: Vec<usize>,
}

impl Assembler {
    fn new(cols: usize) -> Self {
        Self {
            cols,
            values: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn push_rows(&mut self, block: &ClassBlock, rows: std::ops::Range<usize>, class: usize) {
        self.values.reserve(rows.len() * self.cols);
        for r in rows {
            self.values.extend(block.row(r).iter().map(|&p| f64::from(p)));
            self.labels.push(class);
        }
    }

    fn finish(self) -> Result<Split> {
        let data = Matrix::from_vec(self.labels.len(), self.cols, self.values)?;
        Split::new(data, self.labels)
    }
}
