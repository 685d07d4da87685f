// ============================================================
// Layer 5 — Net Base
// ============================================================
// The thin base every classifier sits on:
//
//   Classifier  — the forward contract (images → log-probs),
//                 with an optional per-layer tap used by the
//                 parameter summary
//   Net         — a named model plus its training history;
//                 `summary` prints the layer table and
//                 `gotrain` hands the model to a ModelTrainer

use anyhow::Result;
use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::{path::PathBuf, sync::Arc};

use crate::data::batcher::CifarBatch;
use crate::infra::stats::TrainStats;
use crate::ml::scheduler::LrScheduler;
use crate::ml::summary::{summarize, ModelSummary};
use crate::ml::trainer::ModelTrainer;

// ─── LayerTap ─────────────────────────────────────────────────────────────────
/// Receives one call per executed layer during a tapped forward pass.
pub trait LayerTap {
    fn record(&mut self, kind: &'static str, output_dims: &[usize], params: usize);

    /// When false, callers skip the (non-free) parameter count.
    fn active(&self) -> bool {
        true
    }
}

/// Tap that ignores everything; plain `forward` uses it.
pub struct NoTap;

impl LayerTap for NoTap {
    fn record(&mut self, _kind: &'static str, _output_dims: &[usize], _params: usize) {}

    fn active(&self) -> bool {
        false
    }
}

/// Report a layer holding parameters.
pub fn tap_layer<B, M, const D: usize>(
    tap:    &mut dyn LayerTap,
    kind:   &'static str,
    module: &M,
    output: &Tensor<B, D>,
) where
    B: Backend,
    M: Module<B>,
{
    if tap.active() {
        tap.record(kind, &output.dims(), module.num_params());
    }
}

/// Report a parameter-free operation (pooling, activation, ...).
pub fn tap_op<B: Backend, const D: usize>(
    tap:    &mut dyn LayerTap,
    kind:   &'static str,
    output: &Tensor<B, D>,
) {
    if tap.active() {
        tap.record(kind, &output.dims(), 0);
    }
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// Maps an image batch [N, C, H, W] to class log-probabilities [N, K].
pub trait Classifier<B: Backend> {
    fn forward_tapped(&self, images: Tensor<B, 4>, tap: &mut dyn LayerTap) -> Tensor<B, 2>;

    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward_tapped(images, &mut NoTap)
    }

    /// Sum of absolute weight values, used for L1 regularisation.
    fn l1_penalty(&self) -> Tensor<B, 1>;
}

// ─── Net ──────────────────────────────────────────────────────────────────────
pub struct Net<M> {
    name:  String,
    model: M,
    stats: Option<TrainStats>,
}

impl<M> Net<M> {
    pub fn new(name: impl Into<String>, model: M) -> Self {
        Self { name: name.into(), model, stats: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Statistics of the last training run, None before `gotrain`.
    pub fn stats(&self) -> Option<&TrainStats> {
        self.stats.as_ref()
    }

    /// Print and return the per-layer summary for one input of
    /// shape `input_size` = (channels, height, width).
    pub fn summary<B>(&self, input_size: [usize; 3], device: &B::Device) -> ModelSummary
    where
        B: Backend,
        M: Classifier<B> + Module<B>,
    {
        let summary = summarize(&self.model, input_size, device);
        println!("{summary}");
        summary
    }

    /// Build a ModelTrainer for this model and run it for `epochs`.
    #[allow(clippy::too_many_arguments)]
    pub fn gotrain<B, O>(
        &mut self,
        optimizer:       O,
        train_loader:    Arc<dyn DataLoader<CifarBatch<B>>>,
        test_loader:     Arc<dyn DataLoader<CifarBatch<B::InnerBackend>>>,
        epochs:          usize,
        statspath:       impl Into<PathBuf>,
        scheduler:       LrScheduler,
        batch_scheduler: bool,
        l1_lambda:       f64,
    ) -> Result<()>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + Classifier<B>,
        M::InnerModule: Classifier<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        let trainer = ModelTrainer::new(
            optimizer,
            train_loader,
            test_loader,
            statspath,
            scheduler,
            batch_scheduler,
            l1_lambda,
        );
        self.run_trainer(trainer, epochs)
    }

    /// Run an already configured trainer (e.g. one with checkpointing
    /// enabled) and keep the trained weights and statistics.
    pub fn run_trainer<B, O>(&mut self, mut trainer: ModelTrainer<B, M, O>, epochs: usize) -> Result<()>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + Classifier<B>,
        M::InnerModule: Classifier<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        tracing::info!("Training '{}' for {} epochs", self.name, epochs);
        let (model, stats) = trainer.run(self.model.clone(), epochs)?;
        self.model = model;
        self.stats = Some(stats);
        Ok(())
    }
}
