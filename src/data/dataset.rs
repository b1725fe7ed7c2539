//! Claim/evidence dataset records and JSON loading.

use crate::error::{EvalError, Result};
use serde::Deserialize;
use std::path::Path;

/// Feature vector for a claim or evidence, stored dense or as (index, value) pairs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeatureVector {
    Dense(Vec<f32>),
    Sparse(Vec<(usize, f32)>),
}

impl FeatureVector {
    pub fn is_sparse(&self) -> bool {
        matches!(self, FeatureVector::Sparse(_))
    }

    /// Sparse, or an empty list (an all-zero vector in either layout).
    pub fn is_sparse_compatible(&self) -> bool {
        match self {
            FeatureVector::Sparse(_) => true,
            FeatureVector::Dense(values) => values.is_empty(),
        }
    }

    /// Expand to exactly `dim` values, zero padded.
    /// Fails when a dense vector is longer than `dim` or a sparse index falls outside it.
    pub fn densify(&self, dim: usize) -> Result<Vec<f32>> {
        let mut out = vec![0.0; dim];
        match self {
            FeatureVector::Dense(values) => {
                if values.len() > dim {
                    return Err(EvalError::InvalidInput(format!(
                        "dense vector of length {} exceeds input dimension {}",
                        values.len(),
                        dim
                    )));
                }
                out[..values.len()].copy_from_slice(values);
            }
            FeatureVector::Sparse(pairs) => {
                for &(idx, value) in pairs {
                    let slot = out.get_mut(idx).ok_or_else(|| {
                        EvalError::InvalidInput(format!(
                            "sparse index {} out of range for input dimension {}",
                            idx, dim
                        ))
                    })?;
                    // Repeated indices accumulate, matching a COO -> dense conversion.
                    *slot += value;
                }
            }
        }
        Ok(out)
    }
}

/// One candidate evidence for a claim.
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceCandidate {
    /// Identifier used for ranking and set membership (e.g. "Page_Title 3").
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub features: FeatureVector,
    /// 1 when the evidence supports the claim, else 0.
    pub label: u8,
}

/// A claim with its candidate evidences.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRecord {
    pub claim_id: String,
    pub claim_features: FeatureVector,
    #[serde(default)]
    pub evidences: Vec<EvidenceCandidate>,
}

impl ClaimRecord {
    /// Number of candidates labeled relevant.
    pub fn relevant_count(&self) -> usize {
        self.evidences.iter().filter(|e| e.label == 1).count()
    }
}

/// Precomputed evaluation dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<ClaimRecord>,
}

impl Dataset {
    /// Load a dataset from a JSON array of claim records.
    ///
    /// With `sparse_evidences`, every evidence must carry sparse features.
    pub fn load(path: &Path, sparse_evidences: bool) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let records: Vec<ClaimRecord> = serde_json::from_str(&raw)?;
        let dataset = Dataset { records };
        dataset.validate(sparse_evidences)?;
        let without_relevant = dataset
            .records
            .iter()
            .filter(|r| r.relevant_count() == 0)
            .count();
        log::info!(
            "Loaded {} claims ({} evidences, {} claims without relevant evidence) from {}",
            dataset.len(),
            dataset.evidence_count(),
            without_relevant,
            path.display()
        );
        Ok(dataset)
    }

    fn validate(&self, sparse_evidences: bool) -> Result<()> {
        for record in &self.records {
            for evidence in &record.evidences {
                if evidence.label > 1 {
                    return Err(EvalError::Dataset(format!(
                        "claim {} evidence {}: label must be 0 or 1, got {}",
                        record.claim_id, evidence.id, evidence.label
                    )));
                }
                if sparse_evidences && !evidence.features.is_sparse_compatible() {
                    return Err(EvalError::Dataset(format!(
                        "claim {} evidence {}: expected sparse features",
                        record.claim_id, evidence.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn evidence_count(&self) -> usize {
        self.records.iter().map(|r| r.evidences.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DATASET: &str = r#"[
        {
            "claim_id": "c1",
            "claim_features": [1.0, 0.0],
            "evidences": [
                {"id": "e1", "text": "first", "features": [[0, 1.0]], "label": 1},
                {"id": "e2", "features": [[1, 2.0]], "label": 0}
            ]
        },
        {
            "claim_id": "c2",
            "claim_features": [[1, 1.0]],
            "evidences": [
                {"id": "e3", "text": "third", "features": [0.5, 0.5], "label": 0}
            ]
        }
    ]"#;

    fn write(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("data.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn load_mixed_representations() {
        let dir = TempDir::new().unwrap();
        let dataset = Dataset::load(&write(&dir, DATASET), false).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.evidence_count(), 3);
        assert_eq!(dataset.records[0].relevant_count(), 1);
        assert!(dataset.records[0].evidences[0].features.is_sparse());
        assert!(!dataset.records[1].evidences[0].features.is_sparse());
        assert_eq!(dataset.records[0].evidences[1].text, "");
    }

    #[test]
    fn sparse_flag_rejects_dense_evidence() {
        let dir = TempDir::new().unwrap();
        let err = Dataset::load(&write(&dir, DATASET), true).unwrap_err();
        assert!(matches!(err, EvalError::Dataset(_)));
        assert!(err.to_string().contains("e3"));
    }

    #[test]
    fn sparse_flag_accepts_empty_features() {
        let dir = TempDir::new().unwrap();
        let body = r#"[{"claim_id": "c", "claim_features": [1.0],
            "evidences": [
                {"id": "e1", "features": [[0, 1.0]], "label": 1},
                {"id": "e2", "features": [], "label": 0}
            ]}]"#;
        let dataset = Dataset::load(&write(&dir, body), true).unwrap();
        let empty = &dataset.records[0].evidences[1].features;
        assert!(empty.is_sparse_compatible());
        assert_eq!(empty.densify(2).unwrap(), vec![0.0, 0.0]);
        assert!(!FeatureVector::Dense(vec![0.0]).is_sparse_compatible());
    }

    #[test]
    fn non_binary_label_rejected() {
        let dir = TempDir::new().unwrap();
        let body = r#"[{"claim_id": "c", "claim_features": [1.0],
            "evidences": [{"id": "e", "features": [1.0], "label": 2}]}]"#;
        let err = Dataset::load(&write(&dir, body), false).unwrap_err();
        assert!(err.to_string().contains("label must be 0 or 1"));
    }

    #[test]
    fn malformed_json_is_error() {
        let dir = TempDir::new().unwrap();
        let err = Dataset::load(&write(&dir, "{not json"), false).unwrap_err();
        assert!(matches!(err, EvalError::Json(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Dataset::load(Path::new("does/not/exist.json"), false).unwrap_err();
        assert!(matches!(err, EvalError::Io(_)));
    }

    #[test]
    fn densify_pads_and_scatters() {
        let dense = FeatureVector::Dense(vec![1.0, 2.0]);
        assert_eq!(dense.densify(4).unwrap(), vec![1.0, 2.0, 0.0, 0.0]);

        let sparse = FeatureVector::Sparse(vec![(3, 1.5), (0, 0.5), (3, 1.0)]);
        assert_eq!(sparse.densify(4).unwrap(), vec![0.5, 0.0, 0.0, 2.5]);
    }

    #[test]
    fn densify_rejects_out_of_range() {
        assert!(FeatureVector::Dense(vec![0.0; 5]).densify(4).is_err());
        assert!(FeatureVector::Sparse(vec![(4, 1.0)]).densify(4).is_err());
    }
}
