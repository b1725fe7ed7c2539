//! Evaluation CLI: score a claim/evidence dataset with a pretrained latent semantic
//! model and report accuracy, a classification report and Recall@k.

use anyhow::{Context, Result};
use clap::Parser;
use clsm_eval::{
    data::{ClaimsDict, Dataset},
    eval::{
        output::{self, Predictions, SummaryRecord},
        ClassificationReport, EvalOptions, Evaluator,
    },
    model::LatentSemanticModel,
    Config,
};
use std::path::PathBuf;

/// Evaluate a CLSM checkpoint on a claim/evidence dataset.
#[derive(Parser, Debug)]
#[command(name = "clsm-eval")]
struct Args {
    /// Number of queries per batch.
    #[arg(long, default_value_t = 1)]
    batch_size: usize,

    /// Number of examples per query.
    #[arg(long, default_value_t = 8)]
    data_batch_size: usize,

    /// Learning rate for model (unused at evaluation time).
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Number of epochs (unused at evaluation time).
    #[arg(long, default_value_t = 3)]
    epochs: usize,

    /// Dataset to evaluate.
    #[arg(long, default_value = "shared_task_dev.json")]
    data: PathBuf,

    /// Model checkpoint to evaluate.
    #[arg(long)]
    model: PathBuf,

    /// Claims dictionary (claim id -> text).
    #[arg(long, default_value = "claims_dict.json")]
    claims: PathBuf,

    /// Evidence features are stored as sparse (index, value) pairs.
    #[arg(long)]
    sparse_evidences: bool,

    /// Directory for predicted labels (overrides config).
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if let Some(dir) = args.output_dir.clone() {
        config.output.dir = dir;
    }
    log::debug!(
        "Ignoring training parameters: learning rate {}, epochs {}",
        args.learning_rate,
        args.epochs
    );

    log::info!("Loading model {}", args.model.display());
    let model = LatentSemanticModel::load(&args.model)
        .with_context(|| format!("Failed to load checkpoint {}", args.model.display()))?;

    log::info!("Loading {}", args.data.display());
    let dataset = Dataset::load(&args.data, args.sparse_evidences)
        .with_context(|| format!("Failed to load dataset {}", args.data.display()))?;
    let claims = ClaimsDict::load(&args.claims)
        .with_context(|| format!("Failed to load claims {}", args.claims.display()))?;

    if dataset.is_empty() {
        anyhow::bail!("No claims in {}", args.data.display());
    }

    let options = EvalOptions::from_config(&config, args.batch_size, args.data_batch_size);
    let summary = Evaluator::new(&model, options).run(&dataset, &claims)?;

    println!("\n=== Evaluation Results ===");
    println!("Final accuracy: {:.4}", summary.accuracy());
    println!(
        "Batches: {} evaluated, {} failed, {} total",
        summary.evaluated_batches,
        summary.failures.len(),
        summary.num_batches
    );
    if summary.zero_relevant_claims > 0 {
        println!(
            "Claims without relevant evidence: {} (scored as recall 0)",
            summary.zero_relevant_claims
        );
    }
    println!();
    print!("{}", ClassificationReport::from_labels(&summary.truth, &summary.pred));
    println!();
    for (k, value) in summary.recall.means() {
        println!("Recall@{}: {:.4}", k, value);
    }

    let data_name = args
        .data
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.data.display().to_string());
    let parameters = [
        ("batch size", args.batch_size.to_string()),
        ("data batch size", args.data_batch_size.to_string()),
        ("data", data_name),
    ];

    let predictions_path = output::predictions_path(&config.output.dir, &parameters);
    output::write_predictions(
        &predictions_path,
        &Predictions {
            truth: summary.truth.clone(),
            pred: summary.pred.clone(),
        },
    )?;
    if config.output.write_summary {
        output::write_summary(
            &output::summary_path(&predictions_path),
            &SummaryRecord::new(&summary, &parameters),
        )?;
    }
    println!("\nPredictions written to {}", predictions_path.display());

    Ok(())
}
