// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by the trainer and the
// application layer:
//
//   checkpoint.rs — model weights (Burn CompactRecorder) plus
//                   the TrainConfig JSON needed to rebuild
//                   the model before loading them
//   metrics.rs    — per-epoch metrics appended to a CSV file
//   stats.rs      — full training history as JSON at the
//                   stats path

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Training statistics JSON store
pub mod stats;
