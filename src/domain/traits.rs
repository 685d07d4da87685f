// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to image sources only through
// this trait, so the CIFAR-10 binary reader and the image
// folder reader are interchangeable.

use anyhow::Result;

use crate::domain::image::ImageSample;

/// Which half of a dataset to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can load labelled images.
///
/// Implementations:
///   - CifarBinaryLoader → CIFAR-10 binary batch files
///   - ImageFolderLoader → directory of `<id>_<class>.png` files
pub trait ImageSource {
    fn load(&self, split: Split) -> Result<Vec<ImageSample>>;
}
