// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands `train`, `summary` and
// `evaluate` and all their flags.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::summary_use_case::parse_input_size;
use crate::application::train_use_case::{OptimizerKind, SchedulerKind, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train QuizDNN on CIFAR-10
    Train(TrainArgs),

    /// Print the per-layer parameter summary
    Summary(SummaryArgs),

    /// Score the latest checkpoint on the test split
    Evaluate(EvaluateArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OptimizerArg {
    Sgd,
    Adam,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SchedulerArg {
    Constant,
    Step,
    OneCycle,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CIFAR-10 binary batches, or a folder with train/ and test/ PNGs
    #[arg(long, default_value = "data/cifar10")]
    pub data_dir: String,

    /// Directory to save model checkpoints and the training config
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// JSON file receiving per-epoch statistics (CSV written alongside)
    #[arg(long, default_value = "checkpoints/stats.json")]
    pub stats_path: String,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Base learning rate (peak rate for one-cycle)
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    #[arg(long, value_enum, default_value_t = OptimizerArg::Sgd)]
    pub optimizer: OptimizerArg,

    /// SGD momentum, 0 disables it
    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    /// L2 penalty, 0 disables it
    #[arg(long, default_value_t = 0.0)]
    pub weight_decay: f64,

    #[arg(long, value_enum, default_value_t = SchedulerArg::Constant)]
    pub scheduler: SchedulerArg,

    /// Scheduler steps between decays of the step schedule
    #[arg(long, default_value_t = 8)]
    pub step_size: usize,

    /// Decay factor of the step schedule
    #[arg(long, default_value_t = 0.1)]
    pub gamma: f64,

    /// Warm-up fraction of the one-cycle schedule
    #[arg(long, default_value_t = 0.3)]
    pub pct_start: f64,

    /// Step the scheduler after every batch instead of every epoch
    #[arg(long)]
    pub batch_scheduler: bool,

    /// Weight of the L1 penalty on convolution weights, 0 disables it
    #[arg(long, default_value_t = 0.0)]
    pub l1_lambda: f64,

    /// Dropout after each pre-activation ReLU
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Disable random crop / flip augmentation
    #[arg(long)]
    pub no_augment: bool,

    /// Use at most this many train and test images
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,

    /// Shuffle seed of the training loader
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig,
/// so the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            checkpoint_dir:  a.checkpoint_dir,
            stats_path:      a.stats_path,
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            lr:              a.lr,
            optimizer:       match a.optimizer {
                OptimizerArg::Sgd  => OptimizerKind::Sgd,
                OptimizerArg::Adam => OptimizerKind::Adam,
            },
            momentum:        a.momentum,
            weight_decay:    a.weight_decay,
            scheduler:       match a.scheduler {
                SchedulerArg::Constant => SchedulerKind::Constant,
                SchedulerArg::Step     => SchedulerKind::Step,
                SchedulerArg::OneCycle => SchedulerKind::OneCycle,
            },
            step_size:       a.step_size,
            gamma:           a.gamma,
            pct_start:       a.pct_start,
            batch_scheduler: a.batch_scheduler,
            l1_lambda:       a.l1_lambda,
            dropout:         a.dropout,
            augment:         !a.no_augment,
            limit:           a.limit,
            num_workers:     a.num_workers,
            seed:            a.seed,
        }
    }
}

/// All arguments for the `summary` command
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Input shape as C,H,W
    #[arg(long, default_value = "3,32,32", value_parser = parse_input_size)]
    pub input_size: [usize; 3],

    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Dataset directory; defaults to the one used for training
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_args_to_config() {
        let cli = Cli::try_parse_from([
            "quiz-dnn", "train", "--epochs", "3", "--optimizer", "adam",
            "--scheduler", "one-cycle", "--no-augment", "--limit", "100",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert_eq!(cfg.scheduler, SchedulerKind::OneCycle);
        assert!(!cfg.augment);
        assert_eq!(cfg.limit, Some(100));
    }

    #[test]
    fn test_summary_input_size() {
        let cli = Cli::try_parse_from(["quiz-dnn", "summary", "--input-size", "3,28,28"]).unwrap();
        let Commands::Summary(args) = cli.command else { panic!("expected summary") };
        assert_eq!(args.input_size, [3, 28, 28]);

        assert!(Cli::try_parse_from(["quiz-dnn", "summary", "--input-size", "28,28"]).is_err());
    }
}
