// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here:
//
//   blocks.rs    — convolution block helpers (standard and
//                  depthwise-separable, with optional
//                  BatchNorm / Dropout / ReLU)
//   net.rs       — Classifier trait and the Net base
//                  (summary + delegation to the trainer)
//   model.rs     — QuizDNN: three residual stages, global
//                  average pooling, 1×1 classifier, log-softmax
//   summary.rs   — per-layer output shape / parameter table
//   scheduler.rs — learning-rate schedules
//   trainer.rs   — ModelTrainer epoch loop and evaluation
//
// Backends: NdArray (CPU) by default, Wgpu with the `wgpu`
// cargo feature. Training wraps either in Autodiff.

/// Convolution block helpers
pub mod blocks;

/// Classifier trait and Net base
pub mod net;

/// QuizDNN architecture
pub mod model;

/// Parameter summary table
pub mod summary;

/// Learning-rate schedules
pub mod scheduler;

/// Training loop, checkpointing and evaluation
pub mod trainer;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub type Device = <InferBackend as burn::tensor::backend::Backend>::Device;
