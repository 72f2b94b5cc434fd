// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles samples and splits them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: held out, used only for evaluation
//
// The shuffle is seeded so the same run configuration always
// holds out the same samples.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed`, then keep the first
/// `train_fraction` of them for training and the rest for validation.
/// The fraction is clamped to [0, 1].
pub fn split_train_val<T>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    seed:           u64,
) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let n_train = ((samples.len() as f64) * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let held_out = samples.split_off(n_train.min(samples.len()));

    tracing::debug!(
        "Held out {} of {} samples for validation (seed {})",
        held_out.len(),
        samples.len() + held_out.len(),
        seed,
    );

    (samples, held_out)
}
