// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Rebuilds QuizDNN from the saved train_config.json, loads the
// latest checkpoint and scores it on the test split.

use anyhow::{ensure, Result};
use burn::data::dataloader::DataLoaderBuilder;
use std::path::Path;

use crate::data::{
    batcher::CifarBatcher,
    dataset::CifarDataset,
    open_source,
    transform::Normalizer,
};
use crate::domain::traits::Split;
use crate::infra::{checkpoint::CheckpointManager, stats::StatsStore};
use crate::ml::{
    model::QuizDnn,
    trainer::{evaluate, Evaluation},
    Device, InferBackend,
};

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    /// Falls back to the data directory recorded at training time
    data_dir:       Option<String>,
    batch_size:     usize,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: impl Into<String>, data_dir: Option<String>, batch_size: usize) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), data_dir, batch_size }
    }

    pub fn execute(&self) -> Result<Evaluation> {
        ensure!(self.batch_size > 0, "batch size must be at least 1");
        let device = Device::default();

        let ckpt_manager = CheckpointManager::new(&self.checkpoint_dir)?;
        let cfg = ckpt_manager.load_config()?;
        let data_dir = self.data_dir.clone().unwrap_or_else(|| cfg.data_dir.clone());

        // training history is optional
        match StatsStore::new(&cfg.stats_path).load() {
            Ok(stats) => {
                if let Some(last) = stats.last() {
                    tracing::info!(
                        "Checkpoint trained for {} epochs, last recorded test acc {:.2}%",
                        stats.epochs.len(),
                        last.test_acc * 100.0
                    );
                }
            }
            Err(e) => tracing::debug!("No training history: {:#}", e),
        }

        let model: QuizDnn<InferBackend> = cfg.model_config().init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        let samples = open_source(Path::new(&data_dir)).load(Split::Test)?;
        ensure!(!samples.is_empty(), "no test images found in '{data_dir}'");

        let loader = DataLoaderBuilder::new(CifarBatcher::<InferBackend>::new(device))
            .batch_size(self.batch_size)
            .build(CifarDataset::new(samples, Normalizer::cifar10()));

        let eval = evaluate(&model, loader.as_ref());
        tracing::info!(
            "Evaluated {} images: loss={:.4} acc={:.2}%",
            eval.total,
            eval.loss,
            eval.accuracy() * 100.0
        );
        Ok(eval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untrained_checkpoint_dir_fails() {
        let dir = std::env::temp_dir().join(format!("quiz_dnn_eval_{}", std::process::id()));
        let use_case = EvaluateUseCase::new(dir.to_string_lossy(), None, 16);
        assert!(use_case.execute().is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
