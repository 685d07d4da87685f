// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works on: labelled RGB images and the ten CIFAR-10 classes.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// The ten CIFAR-10 class labels
pub mod class_label;

// A single labelled image in CHW layout
pub mod image;

// Core abstractions (traits) that other layers implement
pub mod traits;
