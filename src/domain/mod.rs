// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// system works with: labelled images, the datasets they come
// from, and the predictions made about them.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Raw images and predictions
pub mod image;

// MNIST / Fashion-MNIST and their splits
pub mod dataset_kind;

// Core abstractions (traits) that other layers implement
pub mod traits;
