// ============================================================
// Layer 4 — CIFAR-10 Binary Loader
// ============================================================
// Reads the "binary version" of CIFAR-10:
//
//   cifar-10-batches-bin/
//     data_batch_1.bin ... data_batch_5.bin   ← 50 000 training images
//     test_batch.bin                          ← 10 000 test images
//
// Every file is a flat run of 3073-byte records:
//   <1 x label byte><1024 x red><1024 x green><1024 x blue>
// i.e. the pixels are already channel-major (CHW), row by row.

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::class_label::ClassLabel;
use crate::domain::image::ImageSample;
use crate::domain::traits::{ImageSource, Split};

pub const IMAGE_SIDE:     usize = 32;
pub const IMAGE_CHANNELS: usize = 3;
pub const IMAGE_BYTES:    usize = IMAGE_CHANNELS * IMAGE_SIDE * IMAGE_SIDE;
pub const RECORD_BYTES:   usize = 1 + IMAGE_BYTES;

const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const TEST_FILE: &str = "test_batch.bin";
const ARCHIVE_DIR: &str = "cifar-10-batches-bin";

/// Loads CIFAR-10 binary batch files from a directory.
/// Implements the ImageSource trait from Layer 3.
pub struct CifarBinaryLoader {
    dir: PathBuf,
}

impl CifarBinaryLoader {
    /// Accepts either the batch directory itself or its parent
    /// (the directory the official archive was extracted into).
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let nested = dir.join(ARCHIVE_DIR);
        let dir = if nested.is_dir() { nested } else { dir.to_path_buf() };
        Self { dir }
    }

    /// True when `dir` looks like a CIFAR-10 binary dataset.
    pub fn detect(dir: impl AsRef<Path>) -> bool {
        let loader = Self::new(dir);
        loader.dir.join(TEST_FILE).is_file() || loader.dir.join(TRAIN_FILES[0]).is_file()
    }

    fn files(&self, split: Split) -> Vec<PathBuf> {
        match split {
            Split::Train => TRAIN_FILES.iter().map(|f| self.dir.join(f)).collect(),
            Split::Test  => vec![self.dir.join(TEST_FILE)],
        }
    }
}

impl ImageSource for CifarBinaryLoader {
    fn load(&self, split: Split) -> Result<Vec<ImageSample>> {
        let mut samples = Vec::new();
        let mut files_read = 0usize;

        for path in self.files(split) {
            if !path.is_file() {
                tracing::warn!("Missing CIFAR-10 batch '{}'", path.display());
                continue;
            }
            let bytes = fs::read(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?;
            let batch = parse_records(&bytes)
                .with_context(|| format!("Malformed CIFAR-10 batch '{}'", path.display()))?;
            tracing::debug!("Loaded {} images from '{}'", batch.len(), path.display());
            samples.extend(batch);
            files_read += 1;
        }

        if files_read == 0 {
            bail!(
                "No CIFAR-10 {:?} batches found in '{}'",
                split,
                self.dir.display()
            );
        }

        tracing::info!("Loaded {} {:?} images", samples.len(), split);
        Ok(samples)
    }
}

/// Decode a buffer of 3073-byte CIFAR-10 records.
/// Pixel bytes are scaled into [0, 1].
pub fn parse_records(bytes: &[u8]) -> Result<Vec<ImageSample>> {
    if bytes.len() % RECORD_BYTES != 0 {
        bail!(
            "buffer of {} bytes is not a whole number of {}-byte records",
            bytes.len(),
            RECORD_BYTES
        );
    }

    bytes
        .chunks_exact(RECORD_BYTES)
        .enumerate()
        .map(|(i, record)| {
            let label = ClassLabel::from_index(record[0] as usize)
                .with_context(|| format!("record {i} has invalid label {}", record[0]))?;
            let pixels: Vec<f32> = record[1..].iter().map(|&b| b as f32 / 255.0).collect();
            ImageSample::new(pixels, IMAGE_CHANNELS, IMAGE_SIDE, IMAGE_SIDE, label)
                .with_context(|| format!("record {i} has the wrong pixel count"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut r = vec![label];
        r.extend(std::iter::repeat(fill).take(IMAGE_BYTES));
        r
    }

    #[test]
    fn test_parse_two_records() {
        let mut bytes = record(3, 255);
        bytes.extend(record(9, 0));
        let samples = parse_records(&bytes).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label, ClassLabel::Cat);
        assert_eq!(samples[1].label, ClassLabel::Truck);
        assert_eq!(samples[0].shape(), [3, 32, 32]);
        assert!((samples[0].at(2, 31, 31) - 1.0).abs() < 1e-6);
        assert_eq!(samples[1].at(0, 0, 0), 0.0);
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let mut bytes = record(1, 7);
        bytes.pop();
        assert!(parse_records(&bytes).is_err());
    }

    #[test]
    fn test_bad_label_rejected() {
        assert!(parse_records(&record(10, 0)).is_err());
    }

    #[test]
    fn test_loader_reads_test_batch() {
        let dir = std::env::temp_dir().join(format!("quiz_dnn_cifar_{}", std::process::id()));
        let nested = dir.join(ARCHIVE_DIR);
        fs::create_dir_all(&nested).unwrap();
        let mut bytes = record(0, 10);
        bytes.extend(record(5, 20));
        fs::write(nested.join(TEST_FILE), &bytes).unwrap();

        assert!(CifarBinaryLoader::detect(&dir));
        let loader = CifarBinaryLoader::new(&dir);
        let test = loader.load(Split::Test).unwrap();
        assert_eq!(test.len(), 2);
        assert_eq!(test[1].label, ClassLabel::Dog);
        // no training batches were written
        assert!(loader.load(Split::Train).is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
