//! Dataset representation and preprocessing
//!
//! Raw data arrives as one pixel block per class for the training and test
//! partitions. `RawDataset<K>` holds them as fixed-size arrays indexed by class
//! id, so the class count is part of the type. The preprocessor turns a raw
//! dataset into train/validation/test `Split`s of scaled feature matrices.

pub mod idx;
pub mod preprocess;

pub use preprocess::{FeatureMask, PreprocessedData, Preprocessor};

use crate::error::{ClassifierError, Result};
use crate::utils::Matrix;

/// Number of digit classes.
pub const NUM_CLASSES: usize = 10;

/// Pixel samples of a single class: `rows × cols` intensities, one sample per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBlock {
    rows: usize,
    cols: usize,
    pixels: Vec<u8>,
}

impl ClassBlock {
    /// Wrap a row-major pixel buffer.
    pub fn new(rows: usize, cols: usize, pixels: Vec<u8>) -> Result<Self> {
        if pixels.len() != rows * cols {
            return Err(ClassifierError::MalformedInput(format!(
                "class block of {rows}x{cols} needs {} pixels, got {}",
                rows * cols,
                pixels.len()
            )));
        }
        Ok(Self { rows, cols, pixels })
    }

    /// Build a block from equally sized rows.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut pixels = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(ClassifierError::MalformedInput(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            pixels.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, pixels)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.cols;
        &self.pixels[start..start + self.cols]
    }
}

/// Training and test class blocks, indexed by class id.
#[derive(Debug, Clone)]
pub struct RawDataset<const K: usize = NUM_CLASSES> {
    train: [ClassBlock; K],
    test: [ClassBlock; K],
}

impl<const K: usize> RawDataset<K> {
    /// Validate and wrap per-class blocks.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if `K` is zero, any block is empty, or column counts differ.
    pub fn new(train: [ClassBlock; K], test: [ClassBlock; K]) -> Result<Self> {
        if K == 0 {
            return Err(ClassifierError::MalformedInput(
                "dataset needs at least one class".to_string(),
            ));
        }
        let cols = train[0].cols();
        if cols == 0 {
            return Err(ClassifierError::MalformedInput(
                "class blocks have no feature columns".to_string(),
            ));
        }

        let partitions = [("training", &train), ("test", &test)];
        for (partition, blocks) in partitions {
            for (class, block) in blocks.iter().enumerate() {
                if block.is_empty() {
                    return Err(ClassifierError::MalformedInput(format!(
                        "{partition} block for class {class} is empty"
                    )));
                }
                if block.cols() != cols {
                    return Err(ClassifierError::MalformedInput(format!(
                        "{partition} block for class {class} has {} columns, expected {cols}",
                        block.cols()
                    )));
                }
            }
        }

        Ok(Self { train, test })
    }

    /// Build from loader output, checking that exactly `K` blocks are present per partition.
    pub fn from_blocks(train: Vec<ClassBlock>, test: Vec<ClassBlock>) -> Result<Self> {
        let train: [ClassBlock; K] = train.try_into().map_err(|blocks: Vec<ClassBlock>| {
            ClassifierError::MalformedInput(format!(
                "expected {K} training class blocks, got {}",
                blocks.len()
            ))
        })?;
        let test: [ClassBlock; K] = test.try_into().map_err(|blocks: Vec<ClassBlock>| {
            ClassifierError::MalformedInput(format!(
                "expected {K} test class blocks, got {}",
                blocks.len()
            ))
        })?;
        Self::new(train, test)
    }

    pub fn num_classes(&self) -> usize {
        K
    }

    /// Column count shared by every block.
    pub fn num_features(&self) -> usize {
        self.train[0].cols()
    }

    pub fn train_block(&self, class: usize) -> &ClassBlock {
        &self.train[class]
    }

    pub fn test_block(&self, class: usize) -> &ClassBlock {
        &self.test[class]
    }

    pub fn train_blocks(&self) -> &[ClassBlock; K] {
        &self.train
    }

    pub fn test_blocks(&self) -> &[ClassBlock; K] {
        &self.test
    }
}

/// A feature matrix with one class label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub data: Matrix,
    pub labels: Vec<usize>,
}

impl Split {
    /// Pair a matrix with its labels.
    pub fn new(data: Matrix, labels: Vec<usize>) -> Result<Self> {
        if data.rows() != labels.len() {
            return Err(ClassifierError::dimension(data.rows(), labels.len()));
        }
        Ok(Self { data, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.data.cols()
    }

    /// Gather the listed rows into a new split.
    pub fn subset(&self, indices: &[usize]) -> Split {
        Split {
            data: self.data.select_rows(indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Row indices of every sample of `class`, in order.
    pub fn indices_of_class(&self, class: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == class)
            .map(|(i, _)| i)
            .collect()
    }
}

/// One-hot `N × K` indicator matrix for `labels`.
///
/// # Errors
///
/// `MalformedInput` if any label is `>= num_classes`.
pub fn one_hot(labels: &[usize], num_classes: usize) -> Result<Matrix> {
    let mut matrix = Matrix::zeros(labels.len(), num_classes);
    for (row, &label) in labels.iter().enumerate() {
        if label >= num_classes {
            return Err(ClassifierError::MalformedInput(format!(
                "label {label} out of range for {num_classes} classes"
            )));
        }
        matrix.set(row, label, 1.0);
    }
    Ok(matrix)
}

/// One-vs-rest indicator for `class`: 1.0 where the label matches, else 0.0.
pub fn binary_indicator(labels: &[usize], class: usize) -> Vec<f64> {
    labels
        .iter()
        .map(|&label| if label == class { 1.0 } else { 0.0 })
        .collect()
}
