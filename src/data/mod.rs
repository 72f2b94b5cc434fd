// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from IDX files on disk to tensor batches.
//
//   IDX files (.gz or plain)
//       │
//       ▼
//   IdxLoader         → parses images and labels
//       │
//       ▼
//   split_train_val   → optional held-out split of the training set
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher      → normalises pixels, stacks tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads MNIST-format IDX files
pub mod loader;

/// Scales and standardises pixel intensities
pub mod preprocessor;

/// Implements Burn's Dataset trait for images
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
