// ============================================================
// Layer 3 — ImageSample Domain Type
// ============================================================
// One labelled RGB image stored channel-major (CHW), the
// layout both the CIFAR-10 binary format and the network use.
//
// pixels.len() == channels * height * width at all times.

use serde::{Deserialize, Serialize};

use crate::domain::class_label::ClassLabel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSample {
    /// Pixel intensities, CHW order. Raw loaders produce [0, 1].
    pub pixels:   Vec<f32>,
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
    pub label:    ClassLabel,
}

impl ImageSample {
    /// Build a sample, returning None when the pixel buffer does
    /// not match the declared shape.
    pub fn new(
        pixels:   Vec<f32>,
        channels: usize,
        height:   usize,
        width:    usize,
        label:    ClassLabel,
    ) -> Option<Self> {
        (pixels.len() == channels * height * width)
            .then_some(Self { pixels, channels, height, width, label })
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }

    /// Index into `pixels` for (channel, row, col).
    pub fn offset(&self, c: usize, y: usize, x: usize) -> usize {
        (c * self.height + y) * self.width + x
    }

    pub fn at(&self, c: usize, y: usize, x: usize) -> f32 {
        self.pixels[self.offset(c, y, x)]
    }
}
