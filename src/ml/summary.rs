// ============================================================
// Layer 5 — Parameter Summary
// ============================================================
// Runs one tapped forward pass on a zero batch and tabulates
// every executed layer with its output shape and parameter
// count, followed by memory estimates (f32, per sample).

use burn::prelude::*;
use std::fmt;

use crate::ml::net::{Classifier, LayerTap};

const RULE:  &str = "----------------------------------------------------------------";
const DRULE: &str = "================================================================";
const BYTES_PER_PARAM: f64 = 4.0;
const MB: f64 = 1024.0 * 1024.0;

/// Batch size of the probe pass. BatchNorm in training mode needs
/// more than one value per channel.
const PROBE_BATCH: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    /// e.g. "Conv2d-1"
    pub name:         String,
    /// Output shape without the batch dimension.
    pub output_shape: Vec<usize>,
    pub params:       usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub input_size:   [usize; 3],
    pub layers:       Vec<LayerSummary>,
    pub total_params: usize,
}

impl ModelSummary {
    pub fn layer_params(&self) -> usize {
        self.layers.iter().map(|l| l.params).sum()
    }

    pub fn input_mb(&self) -> f64 {
        self.input_size.iter().product::<usize>() as f64 * BYTES_PER_PARAM / MB
    }

    /// Activations are kept for the backward pass, hence ×2.
    pub fn forward_backward_mb(&self) -> f64 {
        let elements: usize = self
            .layers
            .iter()
            .map(|l| l.output_shape.iter().product::<usize>())
            .sum();
        2.0 * elements as f64 * BYTES_PER_PARAM / MB
    }

    pub fn params_mb(&self) -> f64 {
        self.total_params as f64 * BYTES_PER_PARAM / MB
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "{:>20}  {:>25} {:>15}", "Layer (type)", "Output Shape", "Param #")?;
        writeln!(f, "{DRULE}")?;
        for layer in &self.layers {
            let shape = std::iter::once("-1".to_string())
                .chain(layer.output_shape.iter().map(|d| d.to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                f,
                "{:>20}  {:>25} {:>15}",
                layer.name,
                format!("[{shape}]"),
                group_thousands(layer.params)
            )?;
        }
        writeln!(f, "{DRULE}")?;
        writeln!(f, "Total params: {}", group_thousands(self.total_params))?;
        writeln!(f, "Trainable params: {}", group_thousands(self.total_params))?;
        writeln!(f, "Non-trainable params: 0")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Input size (MB): {:.2}", self.input_mb())?;
        writeln!(f, "Forward/backward pass size (MB): {:.2}", self.forward_backward_mb())?;
        writeln!(f, "Params size (MB): {:.2}", self.params_mb())?;
        writeln!(
            f,
            "Estimated Total Size (MB): {:.2}",
            self.input_mb() + self.forward_backward_mb() + self.params_mb()
        )?;
        write!(f, "{RULE}")
    }
}

/// Collects layer records during a tapped forward pass.
#[derive(Default)]
struct SummaryTap {
    layers: Vec<LayerSummary>,
}

impl LayerTap for SummaryTap {
    fn record(&mut self, kind: &'static str, output_dims: &[usize], params: usize) {
        let index = self.layers.len() + 1;
        self.layers.push(LayerSummary {
            name:         format!("{kind}-{index}"),
            output_shape: output_dims.iter().skip(1).copied().collect(),
            params,
        });
    }
}

/// Summarize `model` for single inputs of shape (channels, height, width).
pub fn summarize<B, M>(model: &M, input_size: [usize; 3], device: &B::Device) -> ModelSummary
where
    B: Backend,
    M: Classifier<B> + Module<B>,
{
    let [c, h, w] = input_size;
    let probe = Tensor::<B, 4>::zeros([PROBE_BATCH, c, h, w], device);

    let mut tap = SummaryTap::default();
    model.forward_tapped(probe, &mut tap);

    ModelSummary {
        input_size,
        layers: tap.layers,
        total_params: model.num_params(),
    }
}

/// 1234567 → "1,234,567"
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::{QuizDnn, QuizDnnConfig};
    use burn::{
        backend::{Autodiff, NdArray},
        module::AutodiffModule,
    };

    type TestBackend = NdArray;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1728), "1,728");
        assert_eq!(group_thousands(6_573_130), "6,573,130");
    }

    #[test]
    fn test_quiz_dnn_summary_totals() {
        let device = Default::default();
        let model: QuizDnn<TestBackend> = QuizDnnConfig::new().init(&device);
        let summary = summarize(&model, [3, 8, 8], &device);

        assert_eq!(summary.layer_params(), summary.total_params);
        assert_eq!(summary.layers[0].name, "Conv2d-1");
        assert_eq!(summary.layers[0].output_shape, vec![64, 8, 8]);
        assert_eq!(summary.layers[0].params, 3 * 64 * 9);

        let last = summary.layers.last().unwrap();
        assert!(last.name.starts_with("LogSoftmax-"));
        assert_eq!(last.output_shape, vec![10]);

        let text = summary.to_string();
        assert!(text.contains("Layer (type)"));
        assert!(text.contains("Total params:"));
    }

    #[test]
    fn test_inference_summary_keeps_running_stats() {
        let device = Default::default();
        let model: QuizDnn<Autodiff<TestBackend>> = QuizDnnConfig::new().init(&device);
        summarize(&model.valid(), [3, 4, 4], &device);

        let mean: Vec<f32> = model.conv2.norm.running_mean.value().into_data().iter::<f32>().collect();
        assert!(mean.iter().all(|v| *v == 0.0));
    }
}
