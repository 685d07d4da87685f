// ============================================================
// Layer 5 — Convolution Blocks
// ============================================================
// Layer-construction helpers shared by every model:
//
//   conv2d                   → one k×k convolution
//   separable_conv2d         → depthwise k×k (groups = in) + 1×1 pointwise
//   activate                 → append [BatchNorm] [Dropout] [ReLU]
//   create_conv2d            → conv2d + activate (BN + ReLU by default)
//   create_depthwise_conv2d  → separable_conv2d + activate
//
// All helpers return a ConvBlockConfig; `init` turns it into a
// ConvBlock module. PreActConvBlock is the BN → ReLU → conv
// ordering used inside residual stages.
//
// Only zero padding is available in Burn, so there is no
// padding-mode option.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig,
        Dropout, DropoutConfig,
        PaddingConfig2d,
        Relu,
    },
    prelude::*,
};

use crate::ml::net::{tap_layer, tap_op, LayerTap, NoTap};

// ─── ConvBlockConfig ──────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    pub in_channels:  usize,
    pub out_channels: usize,
    #[config(default = 3)]
    pub kernel_size:  usize,
    #[config(default = 1)]
    pub dilation:     usize,
    #[config(default = 1)]
    pub groups:       usize,
    #[config(default = 1)]
    pub padding:      usize,
    #[config(default = false)]
    pub bias:         bool,
    #[config(default = true)]
    pub bn:           bool,
    #[config(default = 0.0)]
    pub dropout:      f64,
    #[config(default = true)]
    pub relu:         bool,
    /// Depthwise k×k followed by a 1×1 pointwise convolution.
    #[config(default = false)]
    pub separable:    bool,
}

/// A bare convolution: no normalization, no activation.
pub fn conv2d(in_channels: usize, out_channels: usize) -> ConvBlockConfig {
    ConvBlockConfig::new(in_channels, out_channels)
        .with_bn(false)
        .with_relu(false)
}

/// A bare depthwise-separable convolution.
pub fn separable_conv2d(in_channels: usize, out_channels: usize) -> ConvBlockConfig {
    conv2d(in_channels, out_channels).with_separable(true)
}

/// Convolution followed by BatchNorm and ReLU.
pub fn create_conv2d(in_channels: usize, out_channels: usize) -> ConvBlockConfig {
    conv2d(in_channels, out_channels).activate(true, 0.0, true)
}

/// Depthwise-separable convolution followed by BatchNorm and ReLU.
pub fn create_depthwise_conv2d(in_channels: usize, out_channels: usize) -> ConvBlockConfig {
    separable_conv2d(in_channels, out_channels).activate(true, 0.0, true)
}

impl ConvBlockConfig {
    /// Select the layers appended after the convolution, in order
    /// BatchNorm (over out_channels), Dropout (only when > 0), ReLU.
    pub fn activate(self, bn: bool, dropout: f64, relu: bool) -> Self {
        self.with_bn(bn).with_dropout(dropout).with_relu(relu)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvBlock<B> {
        let padding = PaddingConfig2d::Explicit(self.padding, self.padding);
        let kernel  = [self.kernel_size, self.kernel_size];
        let dilation = [self.dilation, self.dilation];

        let (conv, pointwise) = if self.separable {
            let depthwise = Conv2dConfig::new([self.in_channels, self.in_channels], kernel)
                .with_groups(self.in_channels)
                .with_dilation(dilation)
                .with_padding(padding)
                .with_bias(self.bias)
                .init(device);
            let pointwise = Conv2dConfig::new([self.in_channels, self.out_channels], [1, 1])
                .with_bias(self.bias)
                .init(device);
            (depthwise, Some(pointwise))
        } else {
            let conv = Conv2dConfig::new([self.in_channels, self.out_channels], kernel)
                .with_groups(self.groups)
                .with_dilation(dilation)
                .with_padding(padding)
                .with_bias(self.bias)
                .init(device);
            (conv, None)
        };

        ConvBlock {
            conv,
            pointwise,
            norm:       self.bn.then(|| BatchNormConfig::new(self.out_channels).init(device)),
            dropout:    (self.dropout > 0.0).then(|| DropoutConfig::new(self.dropout).init()),
            activation: self.relu.then(Relu::new),
        }
    }
}

// ─── ConvBlock ────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv:       Conv2d<B>,
    pub pointwise:  Option<Conv2d<B>>,
    pub norm:       Option<BatchNorm<B, 2>>,
    pub dropout:    Option<Dropout>,
    pub activation: Option<Relu>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.forward_tapped(x, &mut NoTap)
    }

    pub fn forward_tapped(&self, x: Tensor<B, 4>, tap: &mut dyn LayerTap) -> Tensor<B, 4> {
        let mut x = self.conv.forward(x);
        tap_layer(tap, "Conv2d", &self.conv, &x);

        if let Some(pointwise) = &self.pointwise {
            x = pointwise.forward(x);
            tap_layer(tap, "Conv2d", pointwise, &x);
        }
        if let Some(norm) = &self.norm {
            x = norm.forward(x);
            tap_layer(tap, "BatchNorm2d", norm, &x);
        }
        if let Some(dropout) = &self.dropout {
            x = dropout.forward(x);
            tap_op(tap, "Dropout", &x);
        }
        if let Some(relu) = &self.activation {
            x = relu.forward(x);
            tap_op(tap, "ReLU", &x);
        }
        x
    }

    /// Sum of |w| over the convolution weights of this block.
    pub fn l1_penalty(&self) -> Tensor<B, 1> {
        let mut total = self.conv.weight.val().abs().sum();
        if let Some(pointwise) = &self.pointwise {
            total = total + pointwise.weight.val().abs().sum();
        }
        total
    }
}

// ─── PreActConvBlock ──────────────────────────────────────────────────────────
/// BatchNorm → ReLU → [Dropout] → 3×3 convolution, channels preserved.
#[derive(Config, Debug)]
pub struct PreActConvBlockConfig {
    pub channels: usize,
    #[config(default = 0.0)]
    pub dropout:  f64,
}

impl PreActConvBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PreActConvBlock<B> {
        PreActConvBlock {
            norm:    BatchNormConfig::new(self.channels).init(device),
            relu:    Relu::new(),
            dropout: (self.dropout > 0.0).then(|| DropoutConfig::new(self.dropout).init()),
            conv:    Conv2dConfig::new([self.channels, self.channels], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(false)
                .init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct PreActConvBlock<B: Backend> {
    pub norm:    BatchNorm<B, 2>,
    pub relu:    Relu,
    pub dropout: Option<Dropout>,
    pub conv:    Conv2d<B>,
}

impl<B: Backend> PreActConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.forward_tapped(x, &mut NoTap)
    }

    pub fn forward_tapped(&self, x: Tensor<B, 4>, tap: &mut dyn LayerTap) -> Tensor<B, 4> {
        let x = self.norm.forward(x);
        tap_layer(tap, "BatchNorm2d", &self.norm, &x);
        let mut x = self.relu.forward(x);
        tap_op(tap, "ReLU", &x);
        if let Some(dropout) = &self.dropout {
            x = dropout.forward(x);
            tap_op(tap, "Dropout", &x);
        }
        let x = self.conv.forward(x);
        tap_layer(tap, "Conv2d", &self.conv, &x);
        x
    }

    pub fn l1_penalty(&self) -> Tensor<B, 1> {
        self.conv.weight.val().abs().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_create_conv2d_defaults() {
        let cfg = create_conv2d(3, 8);
        assert!(cfg.bn && cfg.relu && !cfg.separable);
        assert_eq!(cfg.dropout, 0.0);

        let block = cfg.init::<TestBackend>(&Default::default());
        assert!(block.norm.is_some());
        assert!(block.dropout.is_none());
        assert!(block.activation.is_some());
        assert!(block.pointwise.is_none());
    }

    #[test]
    fn test_bare_conv_has_no_extras() {
        let block = conv2d(3, 8).init::<TestBackend>(&Default::default());
        assert!(block.norm.is_none());
        assert!(block.activation.is_none());
        assert_eq!(block.conv.weight.dims(), [8, 3, 3, 3]);
    }

    #[test]
    fn test_activate_adds_dropout_only_when_positive() {
        let device = Default::default();
        let with = conv2d(4, 4).activate(false, 0.1, false).init::<TestBackend>(&device);
        let without = conv2d(4, 4).activate(false, 0.0, false).init::<TestBackend>(&device);
        assert!(with.dropout.is_some());
        assert!(without.dropout.is_none());
    }

    #[test]
    fn test_depthwise_separable_weights() {
        let block = separable_conv2d(8, 16).init::<TestBackend>(&Default::default());
        // depthwise: one 3x3 filter per input channel
        assert_eq!(block.conv.weight.dims(), [8, 1, 3, 3]);
        let pointwise = block.pointwise.as_ref().unwrap();
        assert_eq!(pointwise.weight.dims(), [16, 8, 1, 1]);
        assert_eq!(block.num_params(), 8 * 9 + 8 * 16);
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([2, 4, 6, 6], &device);

        let same = create_conv2d(4, 8).init::<TestBackend>(&device).forward(x.clone());
        assert_eq!(same.dims(), [2, 8, 6, 6]);

        let dw = create_depthwise_conv2d(4, 12).init::<TestBackend>(&device).forward(x.clone());
        assert_eq!(dw.dims(), [2, 12, 6, 6]);

        let one = create_conv2d(4, 2)
            .with_kernel_size(1)
            .with_padding(0)
            .init::<TestBackend>(&device)
            .forward(x.clone());
        assert_eq!(one.dims(), [2, 2, 6, 6]);

        let pre = PreActConvBlockConfig::new(4).init::<TestBackend>(&device).forward(x);
        assert_eq!(pre.dims(), [2, 4, 6, 6]);
    }

    #[test]
    fn test_relu_output_non_negative() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::random(
            [1, 3, 5, 5],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let y = create_conv2d(3, 6).init::<TestBackend>(&device).forward(x);
        let min: f32 = y.min().into_scalar().elem();
        assert!(min >= 0.0);
    }

    #[test]
    fn test_l1_penalty_matches_weights() {
        let device = Default::default();
        let block = conv2d(2, 3).init::<TestBackend>(&device);
        let expected: f32 = block.conv.weight.val().abs().sum().into_scalar().elem();
        let got: f32 = block.l1_penalty().into_scalar().elem();
        assert!((expected - got).abs() < 1e-5);
    }
}
