// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates everything else to Layer 2.
//
// Commands:
//   1. `train`    — trains a classifier, saves a checkpoint
//   2. `evaluate` — measures a checkpoint on the test split
//   3. `predict`  — classifies one test image
//   4. `inspect`  — prints what a checkpoint contains
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, InspectArgs, PredictArgs, TrainArgs};

/// The main CLI struct
#[derive(Parser, Debug)]
#[command(
    name = "digit-mlp",
    version,
    about = "Train feed-forward classifiers on MNIST / Fashion-MNIST, then save, reload and query them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Inspect(args)  => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on {} in '{}'", args.data.dataset, args.data.data_dir);

    let use_case = TrainUseCase::new(args.into());
    let report   = use_case.execute()?;

    println!(
        "Training complete. Held-out loss: {:.3}, accuracy: {:.3}. Checkpoint saved.",
        report.loss, report.accuracy
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::from(args).execute()?;
    println!(
        "Test loss: {:.3}.. Test accuracy: {:.3} ({} images)",
        report.loss, report.accuracy, report.samples
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let report = PredictUseCase::from(args).execute()?;
    print!("{}", report.render());
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    print!("{}", InspectUseCase::from(args).execute()?);
    Ok(())
}
