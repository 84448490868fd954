//! Subscription tiers.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Subscription plan of a tenant.
///
/// Variants are declared in ascending tier order; the derived `Ord` and
/// [`Plan::rank`] both follow that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Plan {
    Free,
    Starter,
    Growth,
    Scale,
    Enterprise,
}

impl Plan {
    /// All plans, cheapest first.
    pub const ORDER: [Plan; 5] = [Plan::Free, Plan::Starter, Plan::Growth, Plan::Scale, Plan::Enterprise];

    /// Zero-based index into [`Plan::ORDER`].
    pub fn rank(self) -> usize {
        match self {
            Plan::Free => 0,
            Plan::Starter => 1,
            Plan::Growth => 2,
            Plan::Scale => 3,
            Plan::Enterprise => 4,
        }
    }

    /// `true` when this plan is at least as high as `required`.
    pub fn satisfies(self, required: Plan) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Growth => "growth",
            Plan::Scale => "scale",
            Plan::Enterprise => "enterprise",
        }
    }

    /// Upper-case label used in upgrade messaging ("GROWTH").
    pub fn label(self) -> &'static str {
        match self {
            Plan::Free => "FREE",
            Plan::Starter => "STARTER",
            Plan::Growth => "GROWTH",
            Plan::Scale => "SCALE",
            Plan::Enterprise => "ENTERPRISE",
        }
    }
}

impl core::fmt::Display for Plan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = ConfigurationError;

    /// Strict parse. Unknown names are rejected, never defaulted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Plan::ORDER
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ConfigurationError::UnknownPlan(s.to_string()))
    }
}

impl TryFrom<String> for Plan {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Plan> for String {
    fn from(value: Plan) -> Self {
        value.as_str().to_string()
    }
}
