//! Dataset, claims dictionary and batch collation.

pub mod batch;
pub mod claims;
pub mod dataset;

pub use batch::{Batch, BatchItem, BatchLoader, RawBatch};
pub use claims::ClaimsDict;
pub use dataset::{ClaimRecord, Dataset, EvidenceCandidate, FeatureVector};
