// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    evaluate_use_case::EvaluateUseCase,
    inspect_use_case::InspectUseCase,
    predict_use_case::PredictUseCase,
    train_use_case::TrainConfig,
};
use crate::domain::dataset_kind::DatasetKind;
use crate::ml::trainer::OptimizerKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier and save a checkpoint
    Train(TrainArgs),

    /// Measure a saved checkpoint on the test split
    Evaluate(EvaluateArgs),

    /// Classify one test image with a saved checkpoint
    Predict(PredictArgs),

    /// Print the architecture and tensors stored in a checkpoint
    Inspect(InspectArgs),
}

/// Where the IDX files live and which dataset they hold
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Directory containing the IDX files (plain or .gz)
    #[arg(long, default_value = "data/mnist")]
    pub data_dir: String,

    /// mnist or fashion-mnist
    #[arg(long, default_value_t = DatasetKind::Mnist)]
    pub dataset: DatasetKind,

    /// Keep only the first N samples of each split
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Directory to save the checkpoint, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Hidden layer widths, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [512, 256, 128])]
    pub hidden_layers: Vec<usize>,

    /// Probability of dropping a hidden activation during training
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 2)]
    pub epochs: usize,

    /// Number of images per optimizer step
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    /// adam or sgd
    #[arg(long, default_value_t = OptimizerKind::Adam)]
    pub optimizer: OptimizerKind,

    /// Evaluate on the held-out set every N steps (0 = only at the end)
    #[arg(long, default_value_t = 40)]
    pub print_every: usize,

    /// Hold out this fraction of the training split instead of using the test split
    #[arg(long)]
    pub val_fraction: Option<f64>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data.data_dir,
            dataset:        a.data.dataset,
            checkpoint_dir: a.checkpoint_dir,
            hidden_layers:  a.hidden_layers,
            dropout:        a.dropout,
            epochs:         a.epochs,
            batch_size:     a.batch_size,
            lr:             a.lr,
            optimizer:      a.optimizer,
            print_every:    a.print_every,
            val_fraction:   a.val_fraction,
            limit:          a.data.limit,
            seed:           a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Directory where the checkpoint was saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,
}

impl From<EvaluateArgs> for EvaluateUseCase {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateUseCase {
            checkpoint_dir: a.checkpoint_dir,
            data_dir:       a.data.data_dir,
            dataset:        a.data.dataset,
            batch_size:     a.batch_size,
            limit:          a.data.limit,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Directory with the IDX files
    #[arg(long, default_value = "data/mnist")]
    pub data_dir: String,

    /// mnist or fashion-mnist
    #[arg(long, default_value_t = DatasetKind::Mnist)]
    pub dataset: DatasetKind,

    /// Directory where the checkpoint was saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Which test image to classify
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// How many classes to show
    #[arg(long, default_value_t = 5)]
    pub top_k: usize,
}

impl From<PredictArgs> for PredictUseCase {
    fn from(a: PredictArgs) -> Self {
        PredictUseCase {
            checkpoint_dir: a.checkpoint_dir,
            data_dir:       a.data_dir,
            dataset:        a.dataset,
            index:          a.index,
            top_k:          a.top_k,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

impl From<InspectArgs> for InspectUseCase {
    fn from(a: InspectArgs) -> Self {
        InspectUseCase { checkpoint_dir: a.checkpoint_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["digit-mlp", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.hidden_layers, vec![512, 256, 128]);
        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert_eq!(cfg.dataset, DatasetKind::Mnist);
        assert_eq!(cfg.print_every, 40);
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "digit-mlp", "train",
            "--dataset", "fashion-mnist",
            "--hidden-layers", "400,200",
            "--optimizer", "sgd",
            "--val-fraction", "0.1",
            "--limit", "1000",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.dataset, DatasetKind::FashionMnist);
        assert_eq!(cfg.hidden_layers, vec![400, 200]);
        assert_eq!(cfg.optimizer, OptimizerKind::Sgd);
        assert_eq!(cfg.val_fraction, Some(0.1));
        assert_eq!(cfg.limit, Some(1000));
    }

    #[test]
    fn test_rejects_unknown_dataset() {
        assert!(Cli::try_parse_from(["digit-mlp", "evaluate", "--dataset", "cifar10"]).is_err());
    }
}
