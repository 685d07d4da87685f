// ============================================================
// Layer 2 — SummaryUseCase
// ============================================================
// Builds a fresh QuizDNN and prints its layer table for one
// input shape, without touching any data or checkpoints.

use anyhow::Result;

use crate::ml::{
    model::{QuizDnn, QuizDnnConfig},
    net::Net,
    summary::ModelSummary,
    Device, InferBackend,
};

pub struct SummaryUseCase {
    /// (channels, height, width)
    input_size: [usize; 3],
    dropout:    f64,
}

impl SummaryUseCase {
    pub fn new(input_size: [usize; 3]) -> Self {
        Self { input_size, dropout: 0.0 }
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn execute(&self) -> Result<ModelSummary> {
        let [c, h, w] = self.input_size;
        QuizDnn::<InferBackend>::check_input([1, c, h, w])?;

        let device = Device::default();
        let model: QuizDnn<InferBackend> = QuizDnnConfig::new()
            .with_dropout(self.dropout)
            .init(&device);
        let net = Net::new("QuizDNN", model);
        tracing::info!("Summarising '{}' for input {:?}", net.name(), self.input_size);

        Ok(net.summary::<InferBackend>(self.input_size, &device))
    }
}

/// Parse "3,32,32" (or "3x32x32") into [channels, height, width].
pub fn parse_input_size(s: &str) -> Result<[usize; 3], String> {
    let dims: Vec<usize> = s
        .split([',', 'x'])
        .map(|p| p.trim().parse::<usize>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<_, _>>()?;
    <[usize; 3]>::try_from(dims)
        .map_err(|d| format!("expected 3 dimensions (C,H,W), got {}", d.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_size() {
        assert_eq!(parse_input_size("3,32,32"), Ok([3, 32, 32]));
        assert_eq!(parse_input_size("3x28x28"), Ok([3, 28, 28]));
        assert!(parse_input_size("3,32").is_err());
        assert!(parse_input_size("3,a,32").is_err());
    }

    #[test]
    fn test_rejects_tiny_input() {
        assert!(SummaryUseCase::new([3, 2, 2]).execute().is_err());
        assert!(SummaryUseCase::new([1, 32, 32]).execute().is_err());
    }

    #[test]
    fn test_summary_for_small_input() {
        let summary = SummaryUseCase::new([3, 8, 8]).execute().unwrap();
        assert_eq!(summary.layer_params(), summary.total_params);
        assert!(!summary.layers.is_empty());
    }
}
