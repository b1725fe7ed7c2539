//! Batching and collation of claim records into dense model inputs.

use crate::data::{ClaimRecord, ClaimsDict, Dataset};
use crate::error::{EvalError, Result};

/// One claim with its (truncated) candidate list, densified to the model input dimension.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub claim_id: String,
    pub claim_text: String,
    pub claim: Vec<f32>,
    pub evidences: Vec<Vec<f32>>,
    pub evidence_ids: Vec<String>,
    pub evidence_texts: Vec<String>,
    pub labels: Vec<u8>,
}

impl BatchItem {
    /// Evidence ids labeled relevant, in candidate order.
    pub fn relevant_ids(&self) -> Vec<&str> {
        self.evidence_ids
            .iter()
            .zip(&self.labels)
            .filter(|&(_, &label)| label == 1)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// A group of up to `batch_size` claims.
#[derive(Debug, Clone)]
pub struct Batch {
    pub index: usize,
    pub items: Vec<BatchItem>,
}

impl Batch {
    /// Total number of (claim, evidence) pairs.
    pub fn pair_count(&self) -> usize {
        self.items.iter().map(|i| i.evidences.len()).sum()
    }

    /// Claim and evidence texts, for diagnostics when a batch fails.
    pub fn describe(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{:?} -> {:?}", item.claim_text, item.evidence_texts))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Raw slice of records before collation, so a collation failure can still be
/// attributed to its batch index and logged with its texts.
#[derive(Debug, Clone)]
pub struct RawBatch<'a> {
    pub index: usize,
    pub records: &'a [ClaimRecord],
}

impl RawBatch<'_> {
    pub fn describe(&self, claims: &ClaimsDict) -> String {
        self.records
            .iter()
            .map(|r| {
                let evidences: Vec<&str> = r.evidences.iter().map(|e| e.text.as_str()).collect();
                format!("{:?} -> {:?}", claims.get(&r.claim_id).unwrap_or(""), evidences)
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Splits a dataset into batches and collates them for a fixed input dimension.
pub struct BatchLoader<'a> {
    dataset: &'a Dataset,
    claims: &'a ClaimsDict,
    batch_size: usize,
    data_batch_size: usize,
    input_dim: usize,
}

impl<'a> BatchLoader<'a> {
    /// # Arguments
    ///
    /// * `batch_size` - Claims per batch
    /// * `data_batch_size` - Maximum candidates kept per claim
    /// * `input_dim` - Model input dimension every feature vector is padded to
    pub fn new(
        dataset: &'a Dataset,
        claims: &'a ClaimsDict,
        batch_size: usize,
        data_batch_size: usize,
        input_dim: usize,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(EvalError::InvalidInput("batch size must be greater than 0".into()));
        }
        if data_batch_size == 0 {
            return Err(EvalError::InvalidInput(
                "data batch size must be greater than 0".into(),
            ));
        }
        Ok(Self {
            dataset,
            claims,
            batch_size,
            data_batch_size,
            input_dim,
        })
    }

    /// Number of batches, counting a short final batch.
    pub fn num_batches(&self) -> usize {
        (self.dataset.len() + self.batch_size - 1) / self.batch_size
    }

    pub fn raw_batches(&self) -> impl Iterator<Item = RawBatch<'a>> + '_ {
        self.dataset
            .records
            .chunks(self.batch_size)
            .enumerate()
            .map(|(index, records)| RawBatch { index, records })
    }

    /// Densify and truncate one raw batch.
    pub fn collate(&self, raw: &RawBatch<'_>) -> Result<Batch> {
        let mut items = Vec::with_capacity(raw.records.len());
        for record in raw.records {
            items.push(self.collate_record(record)?);
        }
        Ok(Batch {
            index: raw.index,
            items,
        })
    }

    fn collate_record(&self, record: &ClaimRecord) -> Result<BatchItem> {
        let claim_text = match self.claims.get(&record.claim_id) {
            Some(text) => text.to_string(),
            None => {
                log::warn!("Claim {} missing from claims dictionary", record.claim_id);
                String::new()
            }
        };
        let claim = record
            .claim_features
            .densify(self.input_dim)
            .map_err(|e| EvalError::InvalidInput(format!("claim {}: {}", record.claim_id, e)))?;

        let kept = record.evidences.iter().take(self.data_batch_size);
        let mut item = BatchItem {
            claim_id: record.claim_id.clone(),
            claim_text,
            claim,
            evidences: Vec::new(),
            evidence_ids: Vec::new(),
            evidence_texts: Vec::new(),
            labels: Vec::new(),
        };
        for evidence in kept {
            let features = evidence.features.densify(self.input_dim).map_err(|e| {
                EvalError::InvalidInput(format!(
                    "claim {} evidence {}: {}",
                    record.claim_id, evidence.id, e
                ))
            })?;
            item.evidences.push(features);
            item.evidence_ids.push(evidence.id.clone());
            item.evidence_texts.push(evidence.text.clone());
            item.labels.push(evidence.label);
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EvidenceCandidate, FeatureVector};

    fn record(claim_id: &str, evidences: usize) -> ClaimRecord {
        ClaimRecord {
            claim_id: claim_id.to_string(),
            claim_features: FeatureVector::Dense(vec![1.0]),
            evidences: (0..evidences)
                .map(|i| EvidenceCandidate {
                    id: format!("{}-e{}", claim_id, i),
                    text: format!("evidence {}", i),
                    features: FeatureVector::Sparse(vec![(1, 1.0)]),
                    label: (i % 2) as u8,
                })
                .collect(),
        }
    }

    fn dataset(n: usize) -> Dataset {
        Dataset {
            records: (0..n).map(|i| record(&format!("c{}", i), 4)).collect(),
        }
    }

    #[test]
    fn batches_cover_dataset_with_short_tail() {
        let data = dataset(5);
        let claims = ClaimsDict::default();
        let loader = BatchLoader::new(&data, &claims, 2, 8, 3).unwrap();
        assert_eq!(loader.num_batches(), 3);
        let sizes: Vec<usize> = loader.raw_batches().map(|b| b.records.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        let indices: Vec<usize> = loader.raw_batches().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn collate_truncates_and_pads() {
        let data = dataset(1);
        let claims: ClaimsDict = [("c0".to_string(), "the claim".to_string())].into_iter().collect();
        let loader = BatchLoader::new(&data, &claims, 1, 3, 3).unwrap();
        let raw = loader.raw_batches().next().unwrap();
        let batch = loader.collate(&raw).unwrap();
        let item = &batch.items[0];
        assert_eq!(item.claim_text, "the claim");
        assert_eq!(item.claim, vec![1.0, 0.0, 0.0]);
        assert_eq!(item.evidences.len(), 3);
        assert_eq!(item.evidences[0], vec![0.0, 1.0, 0.0]);
        assert_eq!(item.labels, vec![0, 1, 0]);
        assert_eq!(item.relevant_ids(), vec!["c0-e1"]);
        assert_eq!(batch.pair_count(), 3);
    }

    #[test]
    fn collate_fails_on_oversized_features() {
        let data = dataset(1);
        let claims = ClaimsDict::default();
        // Evidence index 1 does not fit a one-dimensional input.
        let loader = BatchLoader::new(&data, &claims, 1, 8, 1).unwrap();
        let raw = loader.raw_batches().next().unwrap();
        let err = loader.collate(&raw).unwrap_err();
        assert!(err.to_string().contains("c0-e0"));
    }

    #[test]
    fn zero_sizes_rejected() {
        let data = dataset(1);
        let claims = ClaimsDict::default();
        assert!(BatchLoader::new(&data, &claims, 0, 8, 1).is_err());
        assert!(BatchLoader::new(&data, &claims, 1, 0, 1).is_err());
    }
}
