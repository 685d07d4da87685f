// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run:
//
//   Step 1: Load train / test images    (Layer 4 - data)
//   Step 2: Build datasets + loaders    (Layer 4 - data)
//   Step 3: Build QuizDNN, print summary(Layer 5 - ml)
//   Step 4: Save config for evaluation  (Layer 6 - infra)
//   Step 5: Build optimizer + schedule  (Layer 5 - ml)
//   Step 6: Run the ModelTrainer        (Layer 5 - ml)

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{momentum::MomentumConfig, decay::WeightDecayConfig, AdamConfig, SgdConfig},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    batcher::CifarBatcher,
    dataset::CifarDataset,
    open_source,
    splitter::limit_samples,
    transform::{Augmenter, Normalizer},
};
use crate::domain::traits::Split;
use crate::infra::{checkpoint::CheckpointManager, stats::TrainStats};
use crate::ml::{
    model::{QuizDnn, QuizDnnConfig},
    net::Net,
    scheduler::{LrSchedule, LrScheduler},
    trainer::ModelTrainer,
    Device, InferBackend, TrainBackend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerKind {
    /// SGD with (optional) momentum
    Sgd,
    Adam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerKind {
    Constant,
    Step,
    OneCycle,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Serialisable so evaluation can rebuild the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:        String,
    pub checkpoint_dir:  String,
    pub stats_path:      String,
    pub epochs:          usize,
    pub batch_size:      usize,
    pub lr:              f64,
    pub optimizer:       OptimizerKind,
    pub momentum:        f64,
    pub weight_decay:    f64,
    pub scheduler:       SchedulerKind,
    pub step_size:       usize,
    pub gamma:           f64,
    /// Fraction of the one-cycle schedule spent warming up
    pub pct_start:       f64,
    pub batch_scheduler: bool,
    pub l1_lambda:       f64,
    pub dropout:         f64,
    pub augment:         bool,
    /// Cap on training / test samples, for quick runs
    pub limit:           Option<usize>,
    pub num_workers:     usize,
    pub seed:            u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:        "data/cifar10".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            stats_path:      "checkpoints/stats.json".to_string(),
            epochs:          20,
            batch_size:      128,
            lr:              0.01,
            optimizer:       OptimizerKind::Sgd,
            momentum:        0.9,
            weight_decay:    0.0,
            scheduler:       SchedulerKind::Constant,
            step_size:       8,
            gamma:           0.1,
            pct_start:       0.3,
            batch_scheduler: false,
            l1_lambda:       0.0,
            dropout:         0.0,
            augment:         true,
            limit:           None,
            num_workers:     2,
            seed:            42,
        }
    }
}

impl TrainConfig {
    /// Rebuild the model hyperparameters this run trained with.
    pub fn model_config(&self) -> QuizDnnConfig {
        QuizDnnConfig::new().with_dropout(self.dropout)
    }

    /// `steps` is the number of scheduler steps in the whole run.
    pub fn lr_schedule(&self, steps: usize) -> LrSchedule {
        match self.scheduler {
            SchedulerKind::Constant => LrSchedule::Constant,
            SchedulerKind::Step => LrSchedule::Step {
                step_size: self.step_size,
                gamma:     self.gamma,
            },
            SchedulerKind::OneCycle => LrSchedule::OneCycle {
                max_lr:      self.lr,
                total_steps: steps,
                pct_start:   self.pct_start,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.epochs > 0, "epochs must be at least 1");
        ensure!(self.batch_size > 0, "batch size must be at least 1");
        ensure!(self.lr > 0.0, "learning rate must be positive");
        ensure!((0.0..1.0).contains(&self.dropout), "dropout must be in [0, 1)");
        ensure!(self.l1_lambda >= 0.0, "L1 lambda must not be negative");
        ensure!(self.step_size > 0, "step size must be at least 1");
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainStats> {
        let cfg = &self.config;
        cfg.validate()?;
        let device = Device::default();

        // ── Step 1: Load images ───────────────────────────────────────────────
        let source = open_source(Path::new(&cfg.data_dir));
        let train_samples = limit_samples(source.load(Split::Train)?, cfg.limit);
        let test_samples  = limit_samples(source.load(Split::Test)?, cfg.limit);
        ensure!(!train_samples.is_empty(), "no training images found in '{}'", cfg.data_dir);
        ensure!(!test_samples.is_empty(), "no test images found in '{}'", cfg.data_dir);
        let input_size = train_samples[0].shape();
        let [c, h, w] = test_samples[0].shape();
        QuizDnn::<InferBackend>::check_input([1, c, h, w])?;
        let train_count = train_samples.len();
        tracing::info!("Split: {} train, {} test", train_count, test_samples.len());

        // ── Step 2: Datasets and loaders ──────────────────────────────────────
        let mut train_dataset = CifarDataset::new(train_samples, Normalizer::cifar10());
        if cfg.augment {
            train_dataset = train_dataset.with_augmenter(Augmenter::default());
        }
        let test_dataset = CifarDataset::new(test_samples, Normalizer::cifar10());

        let train_loader = DataLoaderBuilder::new(CifarBatcher::<TrainBackend>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed)
            .num_workers(cfg.num_workers)
            .build(train_dataset);
        // test batches run on the inner backend: no autodiff overhead
        let test_loader = DataLoaderBuilder::new(CifarBatcher::<InferBackend>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers)
            .build(test_dataset);

        // ── Step 3: Model ─────────────────────────────────────────────────────
        QuizDnn::<InferBackend>::check_input([1, input_size[0], input_size[1], input_size[2]])?;
        let model: QuizDnn<TrainBackend> = cfg.model_config().init(&device);
        // summarise the inference copy: a probe pass on the autodiff
        // backend would move BatchNorm running statistics
        Net::new("QuizDNN", model.valid()).summary::<InferBackend>(input_size, &device);
        let mut net = Net::new("QuizDNN", model);

        // ── Step 4: Persist config ────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 5: Schedule ──────────────────────────────────────────────────
        let steps = if cfg.batch_scheduler {
            cfg.epochs * train_count.div_ceil(cfg.batch_size)
        } else {
            cfg.epochs
        };
        let scheduler = LrScheduler::new(cfg.lr_schedule(steps), cfg.lr);

        // ── Step 6: Optimizer + training ──────────────────────────────────────
        let weight_decay = (cfg.weight_decay > 0.0)
            .then(|| WeightDecayConfig::new(cfg.weight_decay as f32));

        match cfg.optimizer {
            OptimizerKind::Sgd => {
                let momentum = (cfg.momentum > 0.0).then(|| {
                    MomentumConfig::new()
                        .with_momentum(cfg.momentum)
                        .with_dampening(0.0)
                });
                let optim = SgdConfig::new()
                    .with_momentum(momentum)
                    .with_weight_decay(weight_decay)
                    .init::<TrainBackend, QuizDnn<TrainBackend>>();
                let trainer = ModelTrainer::new(
                    optim, train_loader, test_loader, &cfg.stats_path,
                    scheduler, cfg.batch_scheduler, cfg.l1_lambda,
                )
                .with_checkpoints(ckpt_manager);
                net.run_trainer(trainer, cfg.epochs)?;
            }
            OptimizerKind::Adam => {
                let optim = AdamConfig::new()
                    .with_weight_decay(weight_decay)
                    .init::<TrainBackend, QuizDnn<TrainBackend>>();
                let trainer = ModelTrainer::new(
                    optim, train_loader, test_loader, &cfg.stats_path,
                    scheduler, cfg.batch_scheduler, cfg.l1_lambda,
                )
                .with_checkpoints(ckpt_manager);
                net.run_trainer(trainer, cfg.epochs)?;
            }
        }

        Ok(net.stats().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let cfg = TrainConfig { epochs: 0, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = TrainConfig { dropout: 1.0, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_one_cycle_uses_step_count() {
        let cfg = TrainConfig { scheduler: SchedulerKind::OneCycle, lr: 0.05, ..TrainConfig::default() };
        match cfg.lr_schedule(390) {
            LrSchedule::OneCycle { max_lr, total_steps, .. } => {
                assert_eq!(max_lr, 0.05);
                assert_eq!(total_steps, 390);
            }
            other => panic!("unexpected schedule {other:?}"),
        }
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg = TrainConfig { limit: Some(500), ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.limit, Some(500));
        assert_eq!(back.optimizer, OptimizerKind::Sgd);
    }

    #[test]
    fn test_missing_data_dir_fails() {
        let cfg = TrainConfig {
            data_dir: "/nonexistent/quiz_dnn_data".to_string(),
            ..TrainConfig::default()
        };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }
}
