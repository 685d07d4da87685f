// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From files on disk to tensor batches:
//
//   CIFAR-10 binary batches / PNG folders
//       │
//       ▼
//   CifarBinaryLoader | ImageFolderLoader  → Vec<ImageSample>
//       │
//       ▼
//   limit_samples     → optional random subset
//       │
//       ▼
//   CifarDataset      → Burn Dataset, augment + normalize on get
//       │
//       ▼
//   CifarBatcher      → [N, 3, H, W] images, [N] targets
//       │
//       ▼
//   DataLoader        → feeds batches to the trainer

use std::path::Path;

use crate::domain::traits::ImageSource;

/// CIFAR-10 binary batch reader
pub mod cifar;

/// PNG image-folder reader
pub mod loader;

/// Normalization and augmentation
pub mod transform;

/// Implements Burn's Dataset trait for image samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Random subsetting of a split
pub mod splitter;

/// Pick the reader matching what is found in `dir`: CIFAR-10
/// binary batches when present, otherwise a PNG image folder.
pub fn open_source(dir: &Path) -> Box<dyn ImageSource> {
    if cifar::CifarBinaryLoader::detect(dir) {
        tracing::info!("Reading CIFAR-10 binary batches from '{}'", dir.display());
        Box::new(cifar::CifarBinaryLoader::new(dir))
    } else {
        tracing::info!("Reading image folders from '{}'", dir.display());
        Box::new(loader::ImageFolderLoader::new(dir))
    }
}
