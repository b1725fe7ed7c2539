//! Re-print accuracy and the classification report of a saved predictions file.

use anyhow::Context;
use clap::Parser;
use clsm_eval::eval::{binary_accuracy, output::load_predictions, ClassificationReport};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "report")]
struct Args {
    /// Predictions file written by clsm-eval.
    predictions: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let predictions = load_predictions(&args.predictions)
        .with_context(|| format!("Failed to read {}", args.predictions.display()))?;

    if predictions.truth.len() != predictions.pred.len() {
        anyhow::bail!(
            "{} true labels but {} predictions",
            predictions.truth.len(),
            predictions.pred.len()
        );
    }

    println!(
        "Accuracy: {:.4} ({} pairs)\n",
        binary_accuracy(&predictions.truth, &predictions.pred),
        predictions.truth.len()
    );
    print!(
        "{}",
        ClassificationReport::from_labels(&predictions.truth, &predictions.pred)
    );
    Ok(())
}
