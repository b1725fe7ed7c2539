pub mod clsm;

pub use clsm::{Checkpoint, LatentSemanticModel};

use crate::data::Batch;
use crate::error::Result;

/// A pretrained relevance model scoring (claim, evidence) pairs.
pub trait RelevanceModel {
    /// Input dimension every feature vector is padded to before inference.
    fn input_dim(&self) -> usize;

    /// Raw logits for every pair in the batch, one vector per batch item,
    /// parallel to that item's evidences.
    fn forward(&self, batch: &Batch) -> Result<Vec<Vec<f32>>>;
}

/// Logistic sigmoid mapping a logit into [0, 1].
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
