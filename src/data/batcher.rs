// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<ImageSample>
// into one image tensor [N, C, H, W] plus a target tensor [N].
//
// All samples of a batch must share one shape; CIFAR-10 images
// are always 3x32x32.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::image::ImageSample;

#[derive(Debug, Clone)]
pub struct CifarBatch<B: Backend> {
    /// Normalized pixels — shape: [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// Class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Holds the target device so tensors are created where the
/// model lives.
#[derive(Clone, Debug)]
pub struct CifarBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> CifarBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ImageSample, CifarBatch<B>> for CifarBatcher<B> {
    fn batch(&self, items: Vec<ImageSample>) -> CifarBatch<B> {
        let batch_size = items.len();
        let [channels, height, width] = items
            .first()
            .map(ImageSample::shape)
            .unwrap_or([0, 0, 0]);

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pixels.iter().copied())
            .collect();
        let targets: Vec<i32> = items
            .iter()
            .map(|s| s.label.index() as i32)
            .collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, channels, height, width]),
            &self.device,
        );
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device);

        CifarBatch { images, targets }
    }
}
