// ============================================================
// Layer 5 — QuizDNN Model
// ============================================================
// A CIFAR-10 classifier built from the blocks in blocks.rs.
// Inside each stage every convolution sees the sum of all
// earlier outputs of that stage (dense residual sums).

use anyhow::{ensure, Result};
use burn::{
    nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::domain::class_label::NUM_CLASSES;
use crate::ml::blocks::{conv2d, create_conv2d, ConvBlock, PreActConvBlock, PreActConvBlockConfig};
use crate::ml::net::{tap_op, Classifier, LayerTap, NoTap};

/// Channels expected on the input image.
pub const INPUT_CHANNELS: usize = 3;
/// Two 2×2 max-pools must leave at least one pixel.
pub const MIN_INPUT_SIDE: usize = 4;

#[derive(Config, Debug)]
pub struct QuizDnnConfig {
    #[config(default = "NUM_CLASSES")]
    pub num_classes: usize,
    /// Dropout after each pre-activation ReLU. 0 disables it.
    #[config(default = 0.0)]
    pub dropout:     f64,
}

impl QuizDnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> QuizDnn<B> {
        let pre = |channels: usize| -> PreActConvBlock<B> {
            PreActConvBlockConfig::new(channels)
                .with_dropout(self.dropout)
                .init(device)
        };
        let pointwise = |in_channels: usize, out_channels: usize| -> ConvBlock<B> {
            create_conv2d(in_channels, out_channels)
                .with_kernel_size(1)
                .with_padding(0)
                .init(device)
        };
        let pool = || MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        QuizDnn {
            conv1:  conv2d(INPUT_CHANNELS, 64).init(device),
            conv2:  pre(64),
            conv3:  pre(64),
            pool1:  pool(),
            one1:   pointwise(64, 128),
            conv4:  conv2d(128, 128).init(device),
            conv5:  pre(128),
            conv6:  pre(128),
            pool2:  pool(),
            one2:   pointwise(128, 256),
            conv7:  conv2d(256, 256).init(device),
            conv8:  pre(256),
            conv9:  pre(256),
            gap:    AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            conv10: conv2d(256, self.num_classes)
                .with_kernel_size(1)
                .with_padding(0)
                .with_bias(true)
                .init(device),
            num_classes: self.num_classes,
        }
    }
}

/// Three residual stages (64 → 128 → 256 channels) separated by
/// max-pool + 1×1 expansion, then global average pooling and a
/// 1×1 classifier producing log-probabilities.
#[derive(Module, Debug)]
pub struct QuizDnn<B: Backend> {
    pub conv1:  ConvBlock<B>,
    pub conv2:  PreActConvBlock<B>,
    pub conv3:  PreActConvBlock<B>,
    pub pool1:  MaxPool2d,
    pub one1:   ConvBlock<B>,
    pub conv4:  ConvBlock<B>,
    pub conv5:  PreActConvBlock<B>,
    pub conv6:  PreActConvBlock<B>,
    pub pool2:  MaxPool2d,
    pub one2:   ConvBlock<B>,
    pub conv7:  ConvBlock<B>,
    pub conv8:  PreActConvBlock<B>,
    pub conv9:  PreActConvBlock<B>,
    pub gap:    AdaptiveAvgPool2d,
    pub conv10: ConvBlock<B>,
    pub num_classes: usize,
}

impl<B: Backend> QuizDnn<B> {
    /// images: [batch, 3, H, W] → log-probabilities [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward_tapped(images, &mut NoTap)
    }

    pub fn forward_tapped(&self, x: Tensor<B, 4>, tap: &mut dyn LayerTap) -> Tensor<B, 2> {
        // Stage 1 — 64 channels at full resolution
        let x1 = self.conv1.forward_tapped(x, tap);
        let x2 = self.conv2.forward_tapped(x1.clone(), tap);
        let x3 = self.conv3.forward_tapped(x1.clone() + x2.clone(), tap);
        let x4 = self.pool1.forward(x1 + x2 + x3);
        tap_op(tap, "MaxPool2d", &x4);
        let x4 = self.one1.forward_tapped(x4, tap);

        // Stage 2 — 128 channels at 1/2 resolution.
        // The pooled sum skips x4: only the three conv outputs feed pool2.
        let x5 = self.conv4.forward_tapped(x4.clone(), tap);
        let x6 = self.conv5.forward_tapped(x4.clone() + x5.clone(), tap);
        let x7 = self.conv6.forward_tapped(x4 + x5.clone() + x6.clone(), tap);
        let x8 = self.pool2.forward(x5 + x6 + x7);
        tap_op(tap, "MaxPool2d", &x8);
        let x8 = self.one2.forward_tapped(x8, tap);

        // Stage 3 — 256 channels at 1/4 resolution
        let x9  = self.conv7.forward_tapped(x8.clone(), tap);
        let x10 = self.conv8.forward_tapped(x8.clone() + x9.clone(), tap);
        let x11 = self.conv9.forward_tapped(x8 + x9 + x10, tap);

        let out = self.gap.forward(x11);
        tap_op(tap, "AdaptiveAvgPool2d", &out);
        let out = self.conv10.forward_tapped(out, tap);

        let [batch, _, _, _] = out.dims();
        let out = log_softmax(out.reshape([batch, self.num_classes]), 1);
        tap_op(tap, "LogSoftmax", &out);
        out
    }

    /// Sum of |w| over every convolution weight in the network.
    pub fn l1_penalty(&self) -> Tensor<B, 1> {
        let parts = vec![
            self.conv1.l1_penalty(),
            self.conv2.l1_penalty(),
            self.conv3.l1_penalty(),
            self.one1.l1_penalty(),
            self.conv4.l1_penalty(),
            self.conv5.l1_penalty(),
            self.conv6.l1_penalty(),
            self.one2.l1_penalty(),
            self.conv7.l1_penalty(),
            self.conv8.l1_penalty(),
            self.conv9.l1_penalty(),
            self.conv10.l1_penalty(),
        ];
        Tensor::cat(parts, 0).sum()
    }

    /// Validate an input shape [batch, channels, height, width]
    /// before running a forward pass on it.
    pub fn check_input(dims: [usize; 4]) -> Result<()> {
        let [batch, channels, height, width] = dims;
        ensure!(batch > 0, "batch size must be at least 1");
        ensure!(
            channels == INPUT_CHANNELS,
            "expected {INPUT_CHANNELS} input channels, got {channels}"
        );
        ensure!(
            height >= MIN_INPUT_SIDE && width >= MIN_INPUT_SIDE,
            "input must be at least {MIN_INPUT_SIDE}x{MIN_INPUT_SIDE}, got {height}x{width}"
        );
        Ok(())
    }
}

impl<B: Backend> Classifier<B> for QuizDnn<B> {
    fn forward_tapped(&self, images: Tensor<B, 4>, tap: &mut dyn LayerTap) -> Tensor<B, 2> {
        QuizDnn::forward_tapped(self, images, tap)
    }

    fn l1_penalty(&self) -> Tensor<B, 1> {
        QuizDnn::l1_penalty(self)
    }
}
