//! Batched evaluation loop: inference, ranking, recall@k and accuracy accumulation.

use crate::config::Config;
use crate::data::{Batch, BatchLoader, ClaimsDict, Dataset};
use crate::error::{EvalError, Result};
use crate::eval::metrics::{binary_accuracy, mean, recall_at_k};
use crate::eval::ranking::rank_by_score;
use crate::model::{sigmoid, RelevanceModel};
use std::collections::BTreeMap;

/// Knobs for one evaluation run.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Claims per batch.
    pub batch_size: usize,
    /// Candidates kept per claim.
    pub data_batch_size: usize,
    pub threshold: f32,
    pub recall_intervals: Vec<usize>,
    pub progress_fraction: f64,
    pub progress_recall_k: usize,
    pub max_failed_batches: Option<usize>,
}

impl EvalOptions {
    pub fn from_config(config: &Config, batch_size: usize, data_batch_size: usize) -> Self {
        Self {
            batch_size,
            data_batch_size,
            threshold: config.eval.threshold,
            recall_intervals: config.recall_intervals(),
            progress_fraction: config.eval.progress_fraction,
            progress_recall_k: config.eval.progress_recall_k,
            max_failed_batches: config.eval.max_failed_batches,
        }
    }

    /// Batches between two progress lines, never below one.
    pub fn output_freq(&self, num_batches: usize) -> usize {
        ((num_batches as f64 * self.progress_fraction) as usize).max(1)
    }

    /// Whether a progress line follows batch `batch_num`; never after the first batch.
    pub fn is_progress_batch(batch_num: usize, output_freq: usize) -> bool {
        batch_num > 0 && batch_num % output_freq == 0
    }
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self::from_config(&Config::default(), 1, 8)
    }
}

/// k -> recall value of every evaluated claim.
#[derive(Debug, Clone, Default)]
pub struct RecallTable {
    values: BTreeMap<usize, Vec<f32>>,
}

impl RecallTable {
    pub fn new(ks: &[usize]) -> Self {
        Self {
            values: ks.iter().map(|&k| (k, Vec::new())).collect(),
        }
    }

    pub fn push(&mut self, k: usize, value: f32) {
        self.values.entry(k).or_default().push(value);
    }

    pub fn values(&self, k: usize) -> Option<&[f32]> {
        self.values.get(&k).map(Vec::as_slice)
    }

    pub fn mean(&self, k: usize) -> Option<f32> {
        self.values.get(&k).and_then(|v| mean(v))
    }

    /// (k, mean recall) in ascending k; k with no values yields 0.0.
    pub fn means(&self) -> Vec<(usize, f32)> {
        self.values
            .iter()
            .map(|(&k, v)| (k, mean(v).unwrap_or(0.0)))
            .collect()
    }
}

/// Metrics of one successfully scored batch.
#[derive(Debug, Clone)]
pub struct BatchMetrics {
    pub index: usize,
    /// Pairwise accuracy, `None` when the batch held no pairs.
    pub accuracy: Option<f32>,
    pub truth: Vec<u8>,
    pub pred: Vec<u8>,
    /// Per claim, recall at every configured k.
    pub claim_recalls: Vec<BTreeMap<usize, f32>>,
    /// Mean over claims of recall at the progress cutoff.
    pub progress_recall: f32,
    pub zero_relevant_claims: usize,
}

/// A batch whose collation or inference failed.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub index: usize,
    pub message: String,
    /// Claim and evidence texts of the batch.
    pub inputs: String,
}

#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Evaluated(BatchMetrics),
    Failed(BatchFailure),
}

/// Aggregated result of a run.
#[derive(Debug, Clone)]
pub struct EvalSummary {
    pub num_batches: usize,
    pub evaluated_batches: usize,
    pub failures: Vec<BatchFailure>,
    pub truth: Vec<u8>,
    pub pred: Vec<u8>,
    pub recall: RecallTable,
    pub zero_relevant_claims: usize,
}

impl EvalSummary {
    /// Accuracy over every pooled prediction.
    pub fn accuracy(&self) -> f32 {
        binary_accuracy(&self.truth, &self.pred)
    }
}

/// Running sums between two progress lines.
#[derive(Debug, Default)]
struct ProgressWindow {
    accuracy_sum: f32,
    accuracy_batches: usize,
    recall_sum: f32,
    recall_batches: usize,
}

impl ProgressWindow {
    fn add(&mut self, metrics: &BatchMetrics) {
        if let Some(acc) = metrics.accuracy {
            self.accuracy_sum += acc;
            self.accuracy_batches += 1;
        }
        if !metrics.claim_recalls.is_empty() {
            self.recall_sum += metrics.progress_recall;
            self.recall_batches += 1;
        }
    }

    fn accuracy(&self) -> f32 {
        if self.accuracy_batches == 0 {
            0.0
        } else {
            self.accuracy_sum / self.accuracy_batches as f32
        }
    }

    fn recall(&self) -> f32 {
        if self.recall_batches == 0 {
            0.0
        } else {
            self.recall_sum / self.recall_batches as f32
        }
    }
}

/// Drives a model over a dataset and aggregates the metrics.
pub struct Evaluator<'m, M: RelevanceModel> {
    model: &'m M,
    options: EvalOptions,
}

impl<'m, M: RelevanceModel> Evaluator<'m, M> {
    pub fn new(model: &'m M, options: EvalOptions) -> Self {
        Self { model, options }
    }

    /// Score one collated batch.
    ///
    /// Any inference failure, or logits that do not line up with the candidates,
    /// becomes a `Failed` outcome carrying the batch's texts.
    pub fn evaluate_batch(&self, batch: &Batch) -> BatchOutcome {
        match self.score_batch(batch) {
            Ok(metrics) => BatchOutcome::Evaluated(metrics),
            Err(e) => BatchOutcome::Failed(BatchFailure {
                index: batch.index,
                message: e.to_string(),
                inputs: batch.describe(),
            }),
        }
    }

    fn score_batch(&self, batch: &Batch) -> Result<BatchMetrics> {
        let logits = self.model.forward(batch)?;
        if logits.len() != batch.items.len() {
            return Err(EvalError::Inference(format!(
                "model returned {} score rows for {} claims",
                logits.len(),
                batch.items.len()
            )));
        }

        let mut truth = Vec::with_capacity(batch.pair_count());
        let mut pred = Vec::with_capacity(batch.pair_count());
        let mut claim_recalls = Vec::with_capacity(batch.items.len());
        let mut progress_recalls = Vec::with_capacity(batch.items.len());
        let mut zero_relevant_claims = 0;

        for (item, row) in batch.items.iter().zip(&logits) {
            let scores: Vec<f32> = row.iter().map(|&x| sigmoid(x)).collect();
            let retrieved = rank_by_score(&scores, &item.evidence_ids).map_err(|e| {
                EvalError::Inference(format!("claim {}: {}", item.claim_id, e))
            })?;
            let relevant: Vec<String> =
                item.relevant_ids().into_iter().map(String::from).collect();

            if relevant.is_empty() {
                log::warn!(
                    "Zero relevant evidences for claim {} (batch {})",
                    item.claim_id,
                    batch.index
                );
                zero_relevant_claims += 1;
            }

            let recalls: BTreeMap<usize, f32> = self
                .options
                .recall_intervals
                .iter()
                .map(|&k| (k, recall_at_k(&retrieved, &relevant, Some(k))))
                .collect();
            progress_recalls.push(recall_at_k(
                &retrieved,
                &relevant,
                Some(self.options.progress_recall_k),
            ));
            claim_recalls.push(recalls);

            truth.extend_from_slice(&item.labels);
            // At exactly the threshold (logit 0 for 0.5) the pair is predicted relevant.
            pred.extend(
                scores
                    .iter()
                    .map(|&s| u8::from(s >= self.options.threshold)),
            );
        }

        let accuracy = if truth.is_empty() {
            None
        } else {
            Some(binary_accuracy(&truth, &pred))
        };

        log::debug!(
            "Batch {}: {} pairs, accuracy {:?}",
            batch.index,
            truth.len(),
            accuracy
        );

        Ok(BatchMetrics {
            index: batch.index,
            accuracy,
            truth,
            pred,
            claim_recalls,
            progress_recall: mean(&progress_recalls).unwrap_or(0.0),
            zero_relevant_claims,
        })
    }

    /// Evaluate every batch of the dataset in order.
    ///
    /// Failed batches are logged and recorded in the summary; they contribute no
    /// metrics but still count towards the batch total and progress cadence.
    pub fn run(&self, dataset: &Dataset, claims: &ClaimsDict) -> Result<EvalSummary> {
        let loader = BatchLoader::new(
            dataset,
            claims,
            self.options.batch_size,
            self.options.data_batch_size,
            self.model.input_dim(),
        )?;
        let num_batches = loader.num_batches();
        let output_freq = self.options.output_freq(num_batches);
        log::info!(
            "Evaluating {} batches (batch size {}, {} examples per query)",
            num_batches,
            self.options.batch_size,
            self.options.data_batch_size
        );

        let mut summary = EvalSummary {
            num_batches,
            evaluated_batches: 0,
            failures: Vec::new(),
            truth: Vec::new(),
            pred: Vec::new(),
            recall: RecallTable::new(&self.options.recall_intervals),
            zero_relevant_claims: 0,
        };
        let mut window = ProgressWindow::default();

        for raw in loader.raw_batches() {
            let batch_num = raw.index;
            let outcome = match loader.collate(&raw) {
                Ok(batch) => self.evaluate_batch(&batch),
                Err(e) => BatchOutcome::Failed(BatchFailure {
                    index: batch_num,
                    message: e.to_string(),
                    inputs: raw.describe(claims),
                }),
            };

            match outcome {
                BatchOutcome::Evaluated(metrics) => {
                    window.add(&metrics);
                    summary.evaluated_batches += 1;
                    summary.zero_relevant_claims += metrics.zero_relevant_claims;
                    for recalls in &metrics.claim_recalls {
                        for (&k, &value) in recalls {
                            summary.recall.push(k, value);
                        }
                    }
                    summary.truth.extend(metrics.truth);
                    summary.pred.extend(metrics.pred);
                }
                BatchOutcome::Failed(failure) => {
                    log::error!(
                        "Batch {} failed: {}; inputs: {}",
                        failure.index,
                        failure.message,
                        failure.inputs
                    );
                    summary.failures.push(failure);
                    if let Some(limit) = self.options.max_failed_batches {
                        if summary.failures.len() > limit {
                            return Err(EvalError::TooManyFailures {
                                failed: summary.failures.len(),
                                limit,
                            });
                        }
                    }
                }
            }

            if EvalOptions::is_progress_batch(batch_num, output_freq) {
                log::info!(
                    "[{}]: accuracy: {:.4}, recall@{}: {:.4}",
                    batch_num,
                    window.accuracy(),
                    self.options.progress_recall_k,
                    window.recall()
                );
                window = ProgressWindow::default();
            }
        }

        log::info!(
            "Evaluated {}/{} batches ({} failed)",
            summary.evaluated_batches,
            summary.num_batches,
            summary.failures.len()
        );
        Ok(summary)
    }
}
