// ============================================================
// Layer 5 — ModelTrainer
// ============================================================
// Epoch loop shared by every Classifier:
//
//   train phase  loss = NLL(log-probs, targets) [+ λ·L1(weights)]
//                backward → optimizer step at the scheduled LR
//   test phase   model.valid() (no autodiff, BatchNorm uses
//                running statistics) → NLL + accuracy
//
// After each epoch the metrics are pushed into TrainStats,
// appended to the CSV log and the JSON stats file is rewritten.
//
// The model outputs log-probabilities, so the loss is the
// negative log-likelihood of the target class directly.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::{marker::PhantomData, path::PathBuf, sync::Arc};

use crate::data::batcher::CifarBatch;
use crate::domain::class_label::{ClassLabel, NUM_CLASSES};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::infra::stats::{StatsStore, TrainStats};
use crate::ml::net::Classifier;
use crate::ml::scheduler::LrScheduler;

/// Mean negative log-likelihood. log_probs: [N, K], targets: [N].
pub fn nll_loss<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let [batch] = targets.dims();
    log_probs
        .gather(1, targets.reshape([batch, 1]))
        .mean()
        .neg()
}

/// Predicted class index per row. log_probs: [N, K] → [N].
pub fn predictions<B: Backend>(log_probs: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    let [batch, _] = log_probs.dims();
    log_probs.argmax(1).reshape([batch])
}

/// Number of rows whose arg-max equals the target.
pub fn count_correct<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    predictions(log_probs)
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

// ─── Evaluation ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Mean NLL per sample
    pub loss:     f64,
    pub correct:  usize,
    pub total:    usize,
    /// (correct, total) per class index
    pub per_class: Vec<(usize, usize)>,
}

impl Evaluation {
    pub fn accuracy(&self) -> f64 {
        if self.total > 0 { self.correct as f64 / self.total as f64 } else { 0.0 }
    }

    /// Accuracy of each CIFAR-10 class that appeared in the data.
    pub fn class_accuracies(&self) -> Vec<(ClassLabel, f64)> {
        self.per_class
            .iter()
            .enumerate()
            .filter(|(_, (_, total))| *total > 0)
            .filter_map(|(i, (correct, total))| {
                ClassLabel::from_index(i).map(|l| (l, *correct as f64 / *total as f64))
            })
            .collect()
    }
}

/// Run `model` over every batch of `loader` without gradients.
pub fn evaluate<B, M>(model: &M, loader: &dyn DataLoader<CifarBatch<B>>) -> Evaluation
where
    B: Backend,
    M: Classifier<B>,
{
    let mut loss_sum  = 0.0f64;
    let mut correct   = 0usize;
    let mut total     = 0usize;
    let mut per_class = vec![(0usize, 0usize); NUM_CLASSES];

    for batch in loader.iter() {
        let [n] = batch.targets.dims();
        let output = model.forward(batch.images);

        let batch_loss: f64 = nll_loss(output.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>();
        loss_sum += batch_loss * n as f64;

        let predicted: Vec<i64> = predictions(output).into_data().iter::<i64>().collect();
        let targets:   Vec<i64> = batch.targets.into_data().iter::<i64>().collect();
        for (p, t) in predicted.iter().zip(&targets) {
            let t = *t as usize;
            if t >= per_class.len() {
                per_class.resize(t + 1, (0, 0));
            }
            per_class[t].1 += 1;
            if p == &(t as i64) {
                per_class[t].0 += 1;
                correct += 1;
            }
        }
        total += n;
    }

    Evaluation {
        loss: if total > 0 { loss_sum / total as f64 } else { f64::NAN },
        correct,
        total,
        per_class,
    }
}

// ─── ModelTrainer ─────────────────────────────────────────────────────────────
pub struct ModelTrainer<B, M, O>
where
    B: AutodiffBackend,
{
    optimizer:       O,
    train_loader:    Arc<dyn DataLoader<CifarBatch<B>>>,
    test_loader:     Arc<dyn DataLoader<CifarBatch<B::InnerBackend>>>,
    stats_store:     StatsStore,
    scheduler:       LrScheduler,
    batch_scheduler: bool,
    l1_lambda:       f64,
    checkpoints:     Option<CheckpointManager>,
    _model:          PhantomData<M>,
}

impl<B, M, O> ModelTrainer<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Classifier<B>,
    M::InnerModule: Classifier<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    pub fn new(
        optimizer:       O,
        train_loader:    Arc<dyn DataLoader<CifarBatch<B>>>,
        test_loader:     Arc<dyn DataLoader<CifarBatch<B::InnerBackend>>>,
        statspath:       impl Into<PathBuf>,
        scheduler:       LrScheduler,
        batch_scheduler: bool,
        l1_lambda:       f64,
    ) -> Self {
        Self {
            optimizer,
            train_loader,
            test_loader,
            stats_store: StatsStore::new(statspath),
            scheduler,
            batch_scheduler,
            l1_lambda,
            checkpoints: None,
            _model: PhantomData,
        }
    }

    /// Save the weights after every epoch.
    pub fn with_checkpoints(mut self, checkpoints: CheckpointManager) -> Self {
        self.checkpoints = Some(checkpoints);
        self
    }

    /// Train for `epochs` epochs, returning the trained model and its history.
    pub fn run(&mut self, mut model: M, epochs: usize) -> Result<(M, TrainStats)> {
        let metrics = MetricsLogger::new(self.stats_store.csv_path())?;
        let mut stats = TrainStats::default();

        for epoch in 1..=epochs {
            // with per-batch stepping this is the rate of the first batch
            let epoch_lr = self.scheduler.current();
            let (next, train_loss, train_acc) = self.train_epoch(model);
            model = next;

            let eval = evaluate(&model.valid(), self.test_loader.as_ref());

            if !self.batch_scheduler {
                self.scheduler.step();
            }

            let m = EpochMetrics::new(
                epoch,
                train_loss,
                train_acc,
                eval.loss,
                eval.accuracy(),
                epoch_lr,
            );
            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.2}% | test_loss={:.4} | test_acc={:.2}% | lr={:.6}",
                epoch, epochs, m.train_loss, m.train_acc * 100.0,
                m.test_loss, m.test_acc * 100.0, m.lr,
            );
            tracing::info!(epoch, test_acc = m.test_acc, "epoch finished");

            let improved = stats.best().map_or(true, |b| m.is_improvement(b.test_acc));
            metrics.log(&m)?;
            stats.push(m);
            self.stats_store.save(&stats)?;

            if let Some(ckpt) = &self.checkpoints {
                ckpt.save_model(&model, epoch)?;
                if improved {
                    tracing::info!("Checkpoint for epoch {} is the best so far", epoch);
                }
            }
        }

        tracing::info!("Training complete after {} scheduler steps", self.scheduler.steps_taken());
        Ok((model, stats))
    }

    fn train_epoch(&mut self, mut model: M) -> (M, f64, f64) {
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;
        let mut total    = 0usize;

        for batch in self.train_loader.iter() {
            let [n] = batch.targets.dims();
            let output = model.forward(batch.images);
            correct += count_correct(output.clone().detach(), batch.targets.clone());

            let mut loss = nll_loss(output, batch.targets);
            if self.l1_lambda > 0.0 {
                loss = loss + model.l1_penalty().mul_scalar(self.l1_lambda);
            }

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val * n as f64;
            total    += n;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = self.optimizer.step(self.scheduler.current(), model, grads);

            if self.batch_scheduler {
                self.scheduler.step();
            }
        }

        let (avg_loss, acc) = if total > 0 {
            (loss_sum / total as f64, correct as f64 / total as f64)
        } else {
            (f64::NAN, 0.0)
        };
        (model, avg_loss, acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{batcher::CifarBatcher, dataset::CifarDataset, transform::Normalizer};
    use crate::domain::image::ImageSample;
    use crate::ml::model::{QuizDnn, QuizDnnConfig};
    use crate::ml::net::Net;
    use crate::ml::scheduler::LrSchedule;
    use burn::{
        backend::{Autodiff, NdArray},
        data::dataloader::DataLoaderBuilder,
        optim::SgdConfig,
    };

    type Inner = NdArray;
    type TestBackend = Autodiff<Inner>;

    fn samples() -> Vec<ImageSample> {
        ClassLabel::ALL
            .iter()
            .take(4)
            .map(|&label| {
                let v = label.index() as f32 / 10.0;
                ImageSample::new(vec![v; 3 * 4 * 4], 3, 4, 4, label).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_nll_loss_picks_target_column() {
        let device = Default::default();
        let log_probs = Tensor::<Inner, 2>::from_floats([[-0.5, -2.0], [-3.0, -0.25]], &device);
        let targets = Tensor::<Inner, 1, Int>::from_ints([0, 1], &device);
        let loss: f64 = nll_loss(log_probs.clone(), targets.clone()).into_scalar().elem();
        assert!((loss - 0.375).abs() < 1e-6);
        assert_eq!(count_correct(log_probs, targets), 2);
    }

    #[test]
    fn test_epochs_record_stats() {
        let device = Default::default();
        let dir = std::env::temp_dir().join(format!("quiz_dnn_trainer_{}", std::process::id()));
        let statspath = dir.join("stats.json");
        std::fs::remove_dir_all(&dir).ok();

        let train_loader = DataLoaderBuilder::new(CifarBatcher::<TestBackend>::new(Default::default()))
            .batch_size(2)
            .build(CifarDataset::new(samples(), Normalizer::cifar10()));
        let test_loader = DataLoaderBuilder::new(CifarBatcher::<Inner>::new(Default::default()))
            .batch_size(2)
            .build(CifarDataset::new(samples(), Normalizer::cifar10()));

        let model: QuizDnn<TestBackend> = QuizDnnConfig::new().init(&device);
        let mut net = Net::new("QuizDNN", model);
        assert!(net.stats().is_none());

        net.gotrain(
            SgdConfig::new().init::<TestBackend, QuizDnn<TestBackend>>(),
            train_loader,
            test_loader,
            2,
            &statspath,
            LrScheduler::new(LrSchedule::Step { step_size: 1, gamma: 0.5 }, 0.01),
            false,
            1e-5,
        )
        .unwrap();

        let stats = net.stats().unwrap();
        assert_eq!(stats.epochs.len(), 2);
        let first = &stats.epochs[0];
        assert_eq!(first.epoch, 1);
        assert!(first.train_loss.is_finite());
        assert!((0.0..=1.0).contains(&first.test_acc));

        // each row carries the rate its epoch trained with
        assert!((first.lr - 0.01).abs() < 1e-12);
        assert!((stats.epochs[1].lr - 0.005).abs() < 1e-12);

        assert!(statspath.exists());
        let saved = StatsStore::new(&statspath).load().unwrap();
        assert_eq!(saved.epochs.len(), stats.epochs.len());
        for (s, m) in saved.epochs.iter().zip(&stats.epochs) {
            assert_eq!(s.epoch, m.epoch);
            assert!((s.train_loss - m.train_loss).abs() < 1e-9);
            assert!((s.test_acc - m.test_acc).abs() < 1e-9);
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_evaluate_counts_every_sample() {
        let device = Default::default();
        let loader = DataLoaderBuilder::new(CifarBatcher::<Inner>::new(Default::default()))
            .batch_size(3)
            .build(CifarDataset::new(samples(), Normalizer::cifar10()));
        let model: QuizDnn<Inner> = QuizDnnConfig::new().init(&device);

        let eval = evaluate(&model, loader.as_ref());
        assert_eq!(eval.total, 4);
        assert!(eval.loss.is_finite());
        let seen: usize = eval.per_class.iter().map(|(_, t)| t).sum();
        assert_eq!(seen, 4);
        assert_eq!(eval.class_accuracies().len(), 4);
    }
}
