//! Latent semantic scorer: projects claim and evidence features into a shared
//! latent space and scores pairs by scaled cosine similarity.

use crate::data::Batch;
use crate::error::{EvalError, Result};
use crate::model::RelevanceModel;
use serde::Deserialize;
use std::path::Path;

/// Serialized model weights.
#[derive(Debug, Clone, Deserialize)]
pub struct Checkpoint {
    pub input_dim: usize,
    pub latent_dim: usize,
    /// `latent_dim` rows of `input_dim` weights.
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    /// Smoothing factor applied to the cosine similarity.
    #[serde(default = "default_gamma")]
    pub gamma: f32,
}

fn default_gamma() -> f32 {
    10.0
}

pub struct LatentSemanticModel {
    checkpoint: Checkpoint,
}

impl LatentSemanticModel {
    /// Load and shape-check a JSON checkpoint.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let checkpoint: Checkpoint = serde_json::from_str(&raw)?;
        let model = Self::from_checkpoint(checkpoint)?;
        log::info!(
            "Loaded checkpoint {} ({} -> {} dims, gamma {})",
            path.display(),
            model.checkpoint.input_dim,
            model.checkpoint.latent_dim,
            model.checkpoint.gamma
        );
        Ok(model)
    }

    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self> {
        if checkpoint.input_dim == 0 || checkpoint.latent_dim == 0 {
            return Err(EvalError::Checkpoint(
                "input_dim and latent_dim must be greater than 0".into(),
            ));
        }
        if checkpoint.weights.len() != checkpoint.latent_dim {
            return Err(EvalError::Checkpoint(format!(
                "expected {} weight rows, got {}",
                checkpoint.latent_dim,
                checkpoint.weights.len()
            )));
        }
        if let Some((row, w)) = checkpoint
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.len() != checkpoint.input_dim)
        {
            return Err(EvalError::Checkpoint(format!(
                "weight row {} has {} columns, expected {}",
                row,
                w.len(),
                checkpoint.input_dim
            )));
        }
        if checkpoint.bias.len() != checkpoint.latent_dim {
            return Err(EvalError::Checkpoint(format!(
                "expected {} bias values, got {}",
                checkpoint.latent_dim,
                checkpoint.bias.len()
            )));
        }
        if !checkpoint.gamma.is_finite() {
            return Err(EvalError::Checkpoint("gamma must be finite".into()));
        }
        Ok(Self { checkpoint })
    }

    /// tanh(W x + b)
    fn project(&self, x: &[f32]) -> Result<Vec<f32>> {
        if x.len() != self.checkpoint.input_dim {
            return Err(EvalError::Inference(format!(
                "input has {} features, model expects {}",
                x.len(),
                self.checkpoint.input_dim
            )));
        }
        Ok(self
            .checkpoint
            .weights
            .iter()
            .zip(&self.checkpoint.bias)
            .map(|(row, b)| {
                let dot: f32 = row.iter().zip(x).map(|(w, v)| w * v).sum();
                (dot + b).tanh()
            })
            .collect())
    }

    fn score_pair(&self, claim: &[f32], evidence: &[f32]) -> Result<f32> {
        let evidence = self.project(evidence)?;
        let logit = self.checkpoint.gamma * cosine_similarity(claim, &evidence);
        if !logit.is_finite() {
            return Err(EvalError::Inference(format!("non-finite logit {}", logit)));
        }
        Ok(logit)
    }
}

impl RelevanceModel for LatentSemanticModel {
    fn input_dim(&self) -> usize {
        self.checkpoint.input_dim
    }

    fn forward(&self, batch: &Batch) -> Result<Vec<Vec<f32>>> {
        batch
            .items
            .iter()
            .map(|item| {
                let claim = self.project(&item.claim)?;
                item.evidences
                    .iter()
                    .map(|evidence| self.score_pair(&claim, evidence))
                    .collect::<Result<Vec<f32>>>()
            })
            .collect()
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BatchItem;
    use tempfile::TempDir;

    fn identity_checkpoint() -> Checkpoint {
        Checkpoint {
            input_dim: 2,
            latent_dim: 2,
            weights: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            bias: vec![0.0, 0.0],
            gamma: 5.0,
        }
    }

    fn batch(claim: Vec<f32>, evidences: Vec<Vec<f32>>) -> Batch {
        let n = evidences.len();
        Batch {
            index: 0,
            items: vec![BatchItem {
                claim_id: "c".into(),
                claim_text: String::new(),
                claim,
                evidences,
                evidence_ids: (0..n).map(|i| format!("e{}", i)).collect(),
                evidence_texts: vec![String::new(); n],
                labels: vec![0; n],
            }],
        }
    }

    #[test]
    fn aligned_evidence_scores_higher() {
        let model = LatentSemanticModel::from_checkpoint(identity_checkpoint()).unwrap();
        let logits = model
            .forward(&batch(vec![1.0, 0.0], vec![vec![0.0, 1.0], vec![1.0, 0.0]]))
            .unwrap();
        assert_eq!(logits.len(), 1);
        assert!(logits[0][1] > logits[0][0]);
        assert!((logits[0][1] - 5.0).abs() < 1e-5);
        assert!(logits[0][0].abs() < 1e-5);
    }

    #[test]
    fn wrong_input_length_is_inference_error() {
        let model = LatentSemanticModel::from_checkpoint(identity_checkpoint()).unwrap();
        let err = model
            .forward(&batch(vec![1.0, 0.0], vec![vec![1.0, 0.0, 0.0]]))
            .unwrap_err();
        assert!(matches!(err, EvalError::Inference(_)));
    }

    #[test]
    fn zero_vectors_score_zero() {
        let model = LatentSemanticModel::from_checkpoint(identity_checkpoint()).unwrap();
        let logits = model.forward(&batch(vec![0.0, 0.0], vec![vec![1.0, 1.0]])).unwrap();
        assert_eq!(logits[0][0], 0.0);
    }

    #[test]
    fn shape_mismatch_rejected() {
        let mut ckpt = identity_checkpoint();
        ckpt.weights[1] = vec![0.0];
        assert!(matches!(
            LatentSemanticModel::from_checkpoint(ckpt),
            Err(EvalError::Checkpoint(_))
        ));

        let mut ckpt = identity_checkpoint();
        ckpt.bias.pop();
        assert!(LatentSemanticModel::from_checkpoint(ckpt).is_err());
    }

    #[test]
    fn load_from_file_with_default_gamma() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{"input_dim": 1, "latent_dim": 1, "weights": [[2.0]], "bias": [0.0]}"#,
        )
        .unwrap();
        let model = LatentSemanticModel::load(&path).unwrap();
        assert_eq!(model.input_dim(), 1);
        assert_eq!(model.checkpoint.gamma, 10.0);
    }

    #[test]
    fn missing_checkpoint_is_error() {
        assert!(LatentSemanticModel::load(Path::new("missing.json")).is_err());
    }
}
