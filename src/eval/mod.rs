//! Evaluation framework: candidate ranking, metrics (R@K, P@K, accuracy), the batched
//! evaluation loop, classification report and persisted artifacts.

pub mod metrics;
pub mod output;
pub mod ranking;
pub mod report;
pub mod runner;

pub use metrics::{binary_accuracy, precision_at_k, recall_at_k};
pub use output::{Predictions, SummaryRecord};
pub use ranking::rank_by_score;
pub use report::ClassificationReport;
pub use runner::{BatchOutcome, EvalOptions, EvalSummary, Evaluator, RecallTable};
