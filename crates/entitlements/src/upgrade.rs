//! Minimum-plan lookup for upgrade messaging.

use serde::Serialize;

use crate::catalog::PlanCatalog;
use crate::gate::GateDescriptor;
use crate::plan::Plan;
use crate::resolver::EffectiveEntitlement;
use crate::tag::Feature;

/// "Requires GROWTH plan" annotation for a denied gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeHint {
    pub plan: Plan,
    /// The feature that triggered the hint, when it came from a feature clause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<Feature>,
}

impl core::fmt::Display for UpgradeHint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Requires {} plan", self.plan.label())
    }
}

/// Work out which plan upgrade, if any, would get `entitlement` past `gate`'s
/// plan-related clauses.
///
/// - Missing feature: the cheapest plan that includes it (none when no plan
///   does, e.g. a misspelled tag). The hint never names a plan below
///   `neededPlan`.
/// - Plan below `neededPlan` only: `neededPlan`.
/// - Capability-only denials get no hint; upgrading cannot change a role.
pub fn upgrade_hint(plans: &PlanCatalog, entitlement: &EffectiveEntitlement, gate: &GateDescriptor) -> Option<UpgradeHint> {
    let needed = gate.needed_plan.filter(|p| !entitlement.plan.satisfies(*p));

    match gate.feature.as_ref().filter(|f| !entitlement.features.contains(*f)) {
        Some(feature) => {
            let minimum = plans.minimum_plan_for(feature)?;
            let plan = match needed {
                Some(needed) if needed > minimum => needed,
                _ => minimum,
            };
            Some(UpgradeHint {
                plan,
                feature: Some(feature.clone()),
            })
        }
        None => needed.map(|plan| UpgradeHint { plan, feature: None }),
    }
}
