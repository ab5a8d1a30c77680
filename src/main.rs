//! airqual - Command-line entry point
//!
//! `train` runs the full pipeline on a CSV of sensor records and prints the
//! evaluation report; `classify` maps a concentration to its alert tier.

use airqual::alert::classify;
use airqual::loader::load_csv;
use airqual::partition::SplitRatios;
use airqual::pipeline::{run, PipelineConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "airqual", about = "Air-quality regression pipeline", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and evaluate a model on a CSV of sensor records
    Train {
        /// Path to the records CSV
        #[arg(long)]
        data: PathBuf,
        /// Base seed for every random draw
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Randomized-search trial count
        #[arg(long, default_value_t = 50)]
        trials: usize,
        /// Cross-validation folds
        #[arg(long, default_value_t = 5)]
        folds: usize,
        /// Skip the search and train the fixed default configuration
        #[arg(long)]
        no_tune: bool,
        /// Compute preprocessing statistics over the train prefix only
        #[arg(long)]
        train_only_stats: bool,
        /// Write the report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Classify a pollutant concentration into an alert tier
    Classify {
        value: f64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airqual=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, seed, trials, folds, no_tune, train_only_stats, output } => {
            let frame = load_csv(&data)?;
            let config = PipelineConfig {
                ratios: SplitRatios::default(),
                seed,
                tune: !no_tune,
                n_iter: trials,
                cv_folds: folds,
                train_only_stats,
            };

            let report = run(&frame, &config)?;

            println!("Best parameters: {}", report.model_config.describe());
            if let Some(score) = report.cv_score {
                println!("Best CV score (neg MSE): {score:.6}");
            }
            println!();
            println!("Validation MAE:  {:.4}", report.validation.mae);
            println!("Validation RMSE: {:.4}", report.validation.rmse);
            println!("Validation R2:   {:.4}", report.validation.r2);
            println!();
            println!("Test MAE:  {:.4}", report.test.mae);
            println!("Test RMSE: {:.4}", report.test.rmse);
            println!("Test R2:   {:.4}", report.test.r2);
            println!();
            println!("Comparison with validation performance:");
            println!(
                "  MAE {:+.4}  RMSE {:+.4}  R2 {:+.4}",
                report.test.mae - report.validation.mae,
                report.test.rmse - report.validation.rmse,
                report.test.r2 - report.validation.r2,
            );
            if report.test.r2 < report.validation.r2 - 0.05 {
                println!("  Test degradation vs validation suggests overfitting.");
            }

            let mut importances: Vec<(String, f64)> =
                report.feature_importances.clone().into_iter().collect();
            importances.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            println!();
            println!("Top feature importances:");
            for (name, weight) in importances.iter().take(10) {
                println!("  {name}: {weight:.4}");
            }

            let sample = report.test_predictions.first().copied();
            if let Some(prediction) = sample {
                println!();
                println!(
                    "First test prediction {prediction:.2} -> alert level {}",
                    classify(prediction)
                );
            }

            if let Some(path) = output {
                std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
                println!("Report written to {}", path.display());
            }
        }
        Commands::Classify { value } => {
            println!("{}", classify(value));
        }
    }

    Ok(())
}
