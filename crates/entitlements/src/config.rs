//! Process-level engine configuration.

use core::str::FromStr;
use std::path::PathBuf;

use crate::catalog::{CatalogConfig, Catalogs};
use crate::error::ConfigurationError;
use crate::resolver::MembershipFailurePolicy;

pub const CATALOG_PATH_VAR: &str = "CAMPUSGATE_CATALOG_PATH";
pub const MEMBERSHIP_FAILURES_VAR: &str = "CAMPUSGATE_MEMBERSHIP_FAILURES";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// JSON catalog document; the built-in tables when `None`.
    pub catalog_path: Option<PathBuf>,
    pub membership_failures: MembershipFailurePolicy,
}

impl EngineConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup` (the environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let catalog_path = lookup(CATALOG_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let membership_failures = match lookup(MEMBERSHIP_FAILURES_VAR) {
            None => MembershipFailurePolicy::default(),
            Some(raw) => raw.parse()?,
        };

        Ok(Self {
            catalog_path,
            membership_failures,
        })
    }

    /// Build the catalogs this configuration points at.
    pub fn load_catalogs(&self) -> Result<Catalogs, ConfigurationError> {
        match &self.catalog_path {
            Some(path) => {
                tracing::info!(target: "entitlements", path = %path.display(), "loading catalog file");
                CatalogConfig::load(path)?.into_catalogs()
            }
            None => Ok(Catalogs::builtin()),
        }
    }
}

impl FromStr for MembershipFailurePolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fail-open" => Ok(Self::FailOpen),
            "propagate" => Ok(Self::Propagate),
            _ => Err(ConfigurationError::InvalidSetting {
                key: MEMBERSHIP_FAILURES_VAR,
                value: s.to_string(),
            }),
        }
    }
}
