//! Persisted artifacts: predicted labels and the run summary.

use crate::error::Result;
use crate::eval::runner::EvalSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Parallel true and predicted binary labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    #[serde(rename = "true")]
    pub truth: Vec<u8>,
    pub pred: Vec<u8>,
}

/// Machine-readable metrics written next to the predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub generated_at: DateTime<Utc>,
    pub parameters: Vec<(String, String)>,
    pub accuracy: f32,
    pub recall_at_k: BTreeMap<usize, f32>,
    pub num_batches: usize,
    pub evaluated_batches: usize,
    pub failed_batches: Vec<usize>,
    pub zero_relevant_claims: usize,
}

impl SummaryRecord {
    pub fn new(summary: &EvalSummary, parameters: &[(&str, String)]) -> Self {
        Self {
            generated_at: Utc::now(),
            parameters: parameters
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            accuracy: summary.accuracy(),
            recall_at_k: summary.recall.means().into_iter().collect(),
            num_batches: summary.num_batches,
            evaluated_batches: summary.evaluated_batches,
            failed_batches: summary.failures.iter().map(|f| f.index).collect(),
            zero_relevant_claims: summary.zero_relevant_claims,
        }
    }
}

/// `<dir>/predicted_labels_<key>-<value>...`, spaces in keys and values become underscores.
pub fn predictions_path(dir: &Path, parameters: &[(&str, String)]) -> PathBuf {
    let mut filename = String::from("predicted_labels");
    for (key, value) in parameters {
        filename.push_str(&format!(
            "_{}-{}",
            key.replace(' ', "_"),
            value.replace(' ', "_")
        ));
    }
    dir.join(filename)
}

/// Summary file for a predictions path.
pub fn summary_path(predictions: &Path) -> PathBuf {
    let mut name = predictions.as_os_str().to_owned();
    name.push(".summary.json");
    PathBuf::from(name)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

pub fn write_predictions(path: &Path, predictions: &Predictions) -> Result<()> {
    write_json(path, predictions)
}

pub fn load_predictions(path: &Path) -> Result<Predictions> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_summary(path: &Path, record: &SummaryRecord) -> Result<()> {
    write_json(path, record)
}
