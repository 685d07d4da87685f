// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and routes each
// subcommand to its use case in Layer 2. Printing results
// happens here; computing them does not.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, SummaryArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "quiz-dnn",
    version,
    about = "Train, summarise and evaluate the QuizDNN CIFAR-10 classifier."
)]
pub struct Cli {
    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => Self::run_train(args),
            Commands::Summary(args)  => Self::run_summary(args),
            Commands::Evaluate(args) => Self::run_evaluate(args),
        }
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on images in: {}", args.data_dir);
        let stats = TrainUseCase::new(args.into()).execute()?;

        match (stats.best(), stats.last()) {
            (Some(best), Some(last)) => println!(
                "Training complete. Final test accuracy {:.2}%, best {:.2}% at epoch {}.",
                last.test_acc * 100.0,
                best.test_acc * 100.0,
                best.epoch
            ),
            _ => println!("Training complete."),
        }
        Ok(())
    }

    fn run_summary(args: SummaryArgs) -> Result<()> {
        use crate::application::summary_use_case::SummaryUseCase;

        // the summary table itself is printed by Net::summary
        SummaryUseCase::new(args.input_size)
            .with_dropout(args.dropout)
            .execute()?;
        Ok(())
    }

    fn run_evaluate(args: EvaluateArgs) -> Result<()> {
        use crate::application::evaluate_use_case::EvaluateUseCase;

        let eval = EvaluateUseCase::new(args.checkpoint_dir, args.data_dir, args.batch_size)
            .execute()?;

        println!(
            "\nTest set: average loss {:.4}, accuracy {}/{} ({:.2}%)",
            eval.loss,
            eval.correct,
            eval.total,
            eval.accuracy() * 100.0
        );
        for (label, acc) in eval.class_accuracies() {
            println!("  {:<12} {:>6.2}%", label.name(), acc * 100.0);
        }
        Ok(())
    }
}
