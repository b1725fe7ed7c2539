use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;

/// Claim id -> claim text lookup, used for logging and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ClaimsDict {
    claims: HashMap<String, String>,
}

impl ClaimsDict {
    /// Load from a JSON object mapping claim ids to claim text.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let claims: HashMap<String, String> = serde_json::from_str(&raw)?;
        log::info!("Loaded {} claims from {}", claims.len(), path.display());
        Ok(Self { claims })
    }

    pub fn get(&self, claim_id: &str) -> Option<&str> {
        self.claims.get(claim_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl FromIterator<(String, String)> for ClaimsDict {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            claims: iter.into_iter().collect(),
        }
    }
}
