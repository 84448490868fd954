//! JSON seed format for local membership and override data.
//!
//! ```json
//! {
//!   "memberships": [
//!     { "user_id": "...", "tenant_id": "...", "plan": "growth", "role": "admin", "status": "active" }
//!   ],
//!   "overrides": { "<tenant uuid>": ["fees.online"] }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use campusgate_core::TenantId;
use campusgate_entitlements::MembershipRecord;

use crate::{InMemoryMembershipDirectory, InMemoryOverrideStore};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid seed document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub memberships: Vec<MembershipRecord>,
    #[serde(default)]
    pub overrides: BTreeMap<TenantId, Vec<String>>,
}

impl SeedFile {
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Populate fresh in-memory stores with this seed.
    pub fn into_stores(self) -> (InMemoryMembershipDirectory, InMemoryOverrideStore) {
        tracing::debug!(
            memberships = self.memberships.len(),
            tenants_with_overrides = self.overrides.len(),
            "loading seed data"
        );

        let directory = InMemoryMembershipDirectory::from_records(self.memberships);
        let overrides = InMemoryOverrideStore::new();
        for (tenant_id, features) in self.overrides {
            for feature in features {
                overrides.enable(tenant_id, feature);
            }
        }
        (directory, overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_with_defaults() {
        let seed = SeedFile::from_json(r#"{"memberships": []}"#).unwrap();
        assert_eq!(seed, SeedFile::default());
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        assert!(matches!(
            SeedFile::from_json(r#"{"tenants": []}"#),
            Err(SeedError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SeedFile::load(Path::new("/nonexistent/seed.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/seed.json"));
    }
}
