use burn::data::dataset::Dataset;

use crate::data::transform::{Augmenter, Normalizer};
use crate::domain::image::ImageSample;

/// In-memory image dataset. Augmentation (training only) and
/// normalization are applied lazily on every `get`, so each
/// epoch sees freshly augmented samples.
pub struct CifarDataset {
    samples:    Vec<ImageSample>,
    normalizer: Normalizer,
    augmenter:  Option<Augmenter>,
}

impl CifarDataset {
    pub fn new(samples: Vec<ImageSample>, normalizer: Normalizer) -> Self {
        Self { samples, normalizer, augmenter: None }
    }

    pub fn with_augmenter(mut self, augmenter: Augmenter) -> Self {
        self.augmenter = Some(augmenter);
        self
    }
}

impl Dataset<ImageSample> for CifarDataset {
    fn get(&self, index: usize) -> Option<ImageSample> {
        let raw = self.samples.get(index)?;
        let mut sample = match &self.augmenter {
            Some(aug) => aug.apply(raw, &mut rand::thread_rng()),
            None      => raw.clone(),
        };
        self.normalizer.apply(&mut sample);
        Some(sample)
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
