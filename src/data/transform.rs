// ============================================================
// Layer 4 — Image Transforms
// ============================================================
// Per-sample transforms applied by the dataset before batching:
//
//   Augmenter  → random crop (zero padded) + horizontal flip,
//                training split only
//   Normalizer → (x - mean) / std per channel, both splits
//
// Augmentation runs on raw [0, 1] pixels so the zero padding
// of the crop is black, then normalization is applied.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::image::ImageSample;

/// Per-channel statistics of the CIFAR-10 training set.
pub const CIFAR10_MEAN: [f32; 3] = [0.4914, 0.4822, 0.4465];
pub const CIFAR10_STD:  [f32; 3] = [0.2470, 0.2435, 0.2616];

// ─── Normalizer ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    pub mean: Vec<f32>,
    pub std:  Vec<f32>,
}

impl Normalizer {
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Self {
        Self { mean, std }
    }

    pub fn cifar10() -> Self {
        Self::new(CIFAR10_MEAN.to_vec(), CIFAR10_STD.to_vec())
    }

    /// Normalize in place. Channels beyond the configured
    /// statistics are left untouched.
    pub fn apply(&self, sample: &mut ImageSample) {
        let plane = sample.height * sample.width;
        let channels = sample.channels.min(self.mean.len()).min(self.std.len());
        for c in 0..channels {
            let (mean, std) = (self.mean[c], self.std[c]);
            for v in &mut sample.pixels[c * plane..(c + 1) * plane] {
                *v = (*v - mean) / std;
            }
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::cifar10()
    }
}

// ─── Augmenter ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Augmenter {
    /// Zero padding added on every side before the random crop.
    pub crop_padding: usize,
    /// Probability of a horizontal flip.
    pub flip_prob: f64,
}

impl Default for Augmenter {
    fn default() -> Self {
        Self { crop_padding: 4, flip_prob: 0.5 }
    }
}

impl Augmenter {
    pub fn apply<R: Rng + ?Sized>(&self, sample: &ImageSample, rng: &mut R) -> ImageSample {
        let pad = self.crop_padding;
        let dy = rng.gen_range(0..=2 * pad);
        let dx = rng.gen_range(0..=2 * pad);
        let flip = rng.gen_bool(self.flip_prob.clamp(0.0, 1.0));
        self.crop_and_flip(sample, dy, dx, flip)
    }

    /// Deterministic core of `apply`: take the HxW window starting at
    /// (dy, dx) of the padded image, optionally mirrored left-right.
    pub fn crop_and_flip(&self, sample: &ImageSample, dy: usize, dx: usize, flip: bool) -> ImageSample {
        let (c, h, w) = (sample.channels, sample.height, sample.width);
        let pad = self.crop_padding as isize;
        let mut out = sample.clone();

        for ch in 0..c {
            for y in 0..h {
                let sy = y as isize + dy as isize - pad;
                for x in 0..w {
                    let tx = if flip { w - 1 - x } else { x };
                    let sx = x as isize + dx as isize - pad;
                    let inside = sy >= 0 && sy < h as isize && sx >= 0 && sx < w as isize;
                    let v = if inside {
                        sample.at(ch, sy as usize, sx as usize)
                    } else {
                        0.0
                    };
                    out.pixels[(ch * h + y) * w + tx] = v;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::class_label::ClassLabel;

    fn ramp(h: usize, w: usize) -> ImageSample {
        let pixels = (0..h * w).map(|v| v as f32 + 1.0).collect();
        ImageSample::new(pixels, 1, h, w, ClassLabel::Frog).unwrap()
    }

    #[test]
    fn test_normalize_cifar_mean_to_zero() {
        let pixels = CIFAR10_MEAN.iter().flat_map(|&m| [m, m]).collect();
        let mut s = ImageSample::new(pixels, 3, 1, 2, ClassLabel::Ship).unwrap();
        Normalizer::cifar10().apply(&mut s);
        assert!(s.pixels.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_centered_crop_without_flip_is_identity() {
        let s = ramp(3, 3);
        let aug = Augmenter { crop_padding: 1, flip_prob: 0.0 };
        assert_eq!(aug.crop_and_flip(&s, 1, 1, false), s);
    }

    #[test]
    fn test_shifted_crop_pads_with_zero() {
        let s = ramp(2, 2); // [[1,2],[3,4]]
        let aug = Augmenter { crop_padding: 1, flip_prob: 0.0 };
        let out = aug.crop_and_flip(&s, 0, 0, false);
        assert_eq!(out.pixels, vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_flip_mirrors_columns() {
        let s = ramp(1, 3);
        let aug = Augmenter { crop_padding: 0, flip_prob: 1.0 };
        let out = aug.apply(&s, &mut rand::thread_rng());
        assert_eq!(out.pixels, vec![3.0, 2.0, 1.0]);
    }
}
