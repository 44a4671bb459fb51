//! IDX (MNIST ubyte) dataset loader
//!
//! Reads the standard `train-images.idx3-ubyte` / `train-labels.idx1-ubyte` /
//! `t10k-images.idx3-ubyte` / `t10k-labels.idx1-ubyte` files and groups the
//! images into one block per digit, preserving file order within each class.

use std::fs;
use std::path::Path;

use tracing::info;

use super::{ClassBlock, RawDataset, NUM_CLASSES};
use crate::error::{ClassifierError, Result};

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;

pub const TRAIN_IMAGES: &str = "train-images.idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels.idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images.idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels.idx1-ubyte";

/// Decoded IDX image file.
#[derive(Debug, Clone)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    pub pixels: Vec<u8>,
}

impl IdxImages {
    /// Pixels per image.
    pub fn image_size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn image(&self, index: usize) -> &[u8] {
        let size = self.image_size();
        &self.pixels[index * size..(index + 1) * size]
    }
}

fn read_be_u32(data: &[u8], offset: &mut usize) -> Result<u32> {
    let bytes = data
        .get(*offset..*offset + 4)
        .ok_or_else(|| ClassifierError::MalformedInput("IDX header is truncated".to_string()))?;
    *offset += 4;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

// `len` bytes starting at `offset`, or None when out of range.
fn payload(data: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    data.get(offset..offset.checked_add(len)?)
}

/// Decode an IDX3 image buffer.
pub fn parse_images(data: &[u8]) -> Result<IdxImages> {
    let mut offset = 0usize;
    let magic = read_be_u32(data, &mut offset)?;
    if magic != IMAGE_MAGIC {
        return Err(ClassifierError::MalformedInput(format!(
            "bad IDX image magic number {magic}"
        )));
    }
    let count = read_be_u32(data, &mut offset)? as usize;
    let rows = read_be_u32(data, &mut offset)? as usize;
    let cols = read_be_u32(data, &mut offset)? as usize;
    let total = count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(cols))
        .ok_or_else(|| {
            ClassifierError::MalformedInput(format!(
                "IDX image dimensions {count}x{rows}x{cols} overflow"
            ))
        })?;

    let pixels = payload(data, offset, total)
        .ok_or_else(|| ClassifierError::MalformedInput("IDX image file is truncated".to_string()))?
        .to_vec();

    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels,
    })
}

/// Decode an IDX1 label buffer.
pub fn parse_labels(data: &[u8]) -> Result<Vec<u8>> {
    let mut offset = 0usize;
    let magic = read_be_u32(data, &mut offset)?;
    if magic != LABEL_MAGIC {
        return Err(ClassifierError::MalformedInput(format!(
            "bad IDX label magic number {magic}"
        )));
    }
    let count = read_be_u32(data, &mut offset)? as usize;
    payload(data, offset, count)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| ClassifierError::MalformedInput("IDX label file is truncated".to_string()))
}

/// Split images into `num_classes` blocks indexed by label.
pub fn group_by_class(
    images: &IdxImages,
    labels: &[u8],
    num_classes: usize,
) -> Result<Vec<ClassBlock>> {
    if images.count != labels.len() {
        return Err(ClassifierError::MalformedInput(format!(
            "{} images but {} labels",
            images.count,
            labels.len()
        )));
    }

    let size = images.image_size();
    let mut buckets: Vec<Vec<u8>> = vec![Vec::new(); num_classes];
    for (index, &label) in labels.iter().enumerate() {
        let class = label as usize;
        let bucket = buckets.get_mut(class).ok_or_else(|| {
            ClassifierError::MalformedInput(format!(
                "label {class} out of range for {num_classes} classes"
            ))
        })?;
        bucket.extend_from_slice(images.image(index));
    }

    buckets
        .into_iter()
        .map(|pixels| ClassBlock::new(pixels.len() / size.max(1), size, pixels))
        .collect()
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        ClassifierError::Io(std::io::Error::new(
            e.kind(),
            format!("could not read {}: {e}", path.display()),
        ))
    })
}

/// Load one partition (images + labels) as per-class blocks.
pub fn load_partition(images_path: &Path, labels_path: &Path) -> Result<Vec<ClassBlock>> {
    let images = parse_images(&read_file(images_path)?)?;
    let labels = parse_labels(&read_file(labels_path)?)?;
    group_by_class(&images, &labels, NUM_CLASSES)
}

/// Load the four MNIST files from `dir` as a ten-class raw dataset.
pub fn load_mnist(dir: &Path) -> Result<RawDataset<NUM_CLASSES>> {
    let train = load_partition(&dir.join(TRAIN_IMAGES), &dir.join(TRAIN_LABELS))?;
    let test = load_partition(&dir.join(TEST_IMAGES), &dir.join(TEST_LABELS))?;
    info!(
        train = train.iter().map(ClassBlock::rows).sum::<usize>(),
        test = test.iter().map(ClassBlock::rows).sum::<usize>(),
        dir = %dir.display(),
        "loaded MNIST"
    );
    RawDataset::from_blocks(train, test)
}

/// Encode images in IDX3 format.
pub fn encode_images(rows: usize, cols: usize, pixels: &[u8]) -> Vec<u8> {
    let size = rows * cols;
    let count = pixels.len() / size.max(1);
    let mut out = Vec::with_capacity(16 + pixels.len());
    for value in [IMAGE_MAGIC, count as u32, rows as u32, cols as u32] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(pixels);
    out
}

/// Encode labels in IDX1 format.
pub fn encode_labels(labels: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + labels.len());
    out.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
    out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    out.extend_from_slice(labels);
    out
}
