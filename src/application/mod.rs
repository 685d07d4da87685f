// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for one user goal each.
//
// Rules for this layer:
//   - No model code here (that's Layer 5)
//   - No argument parsing (that's Layer 1)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;

// Print the per-layer parameter summary
pub mod summary_use_case;

// Score a trained checkpoint on the test split
pub mod evaluate_use_case;
