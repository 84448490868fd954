//! Gate Evaluator.
//!
//! A gate is `{capability?, feature?, neededPlan?}` evaluated as
//! `capability AND feature AND plan-rank`, with absent clauses satisfied.
//!
//! - No IO
//! - No panics
//! - Denial is a `false`, never an error

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::plan::Plan;
use crate::resolver::EffectiveEntitlement;
use crate::role::Role;
use crate::tag::{Capability, Feature};

/// Point-of-use access requirement.
///
/// The JSON shape (`capability`, `feature`, `neededPlan`) is shared with
/// every UI call site and must not change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GateDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<Capability>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<Feature>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needed_plan: Option<Plan>,
}

impl GateDescriptor {
    /// A gate with no constraints. It always allows; sensitive call sites
    /// must set at least one clause.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    pub fn feature(mut self, feature: Feature) -> Self {
        self.feature = Some(feature);
        self
    }

    pub fn needed_plan(mut self, plan: Plan) -> Self {
        self.needed_plan = Some(plan);
        self
    }

    pub fn is_open(&self) -> bool {
        self.capability.is_none() && self.feature.is_none() && self.needed_plan.is_none()
    }

    /// Parse a descriptor from a call site's JSON, validating plan and tags.
    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(raw).map_err(|e| ConfigurationError::malformed(e.to_string()))
    }
}

/// Evaluate `gate` against `entitlement`.
pub fn allow(entitlement: &EffectiveEntitlement, gate: &GateDescriptor) -> bool {
    let capability_ok = gate
        .capability
        .as_ref()
        .is_none_or(|c| entitlement.capabilities.contains(c));
    let feature_ok = gate.feature.as_ref().is_none_or(|f| entitlement.features.contains(f));
    let plan_ok = gate.needed_plan.is_none_or(|p| entitlement.plan.satisfies(p));

    capability_ok && feature_ok && plan_ok
}

// ─────────────────────────────────────────────────────────────────────────────
// Gate explanation (audit trail)
// ─────────────────────────────────────────────────────────────────────────────

/// One clause of a gate that the entitlement did not satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnmetClause {
    MissingCapability { capability: Capability },
    MissingFeature { feature: Feature },
    PlanBelowRequired { current: Plan, required: Plan },
}

impl core::fmt::Display for UnmetClause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UnmetClause::MissingCapability { capability } => write!(f, "role lacks capability '{capability}'"),
            UnmetClause::MissingFeature { feature } => write!(f, "tenant lacks feature '{feature}'"),
            UnmetClause::PlanBelowRequired { current, required } => {
                write!(f, "plan '{current}' is below required '{required}'")
            }
        }
    }
}

/// Why a gate was (or would be) allowed or denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateExplanation {
    pub allowed: bool,
    pub plan: Plan,
    pub role: Role,
    pub gate: GateDescriptor,
    /// Empty iff `allowed`.
    pub unmet: Vec<UnmetClause>,
    pub reason: String,
}

/// Evaluate `gate` clause by clause and report every unmet clause.
///
/// `explain(e, g).allowed == allow(e, g)` for all inputs.
pub fn explain(entitlement: &EffectiveEntitlement, gate: &GateDescriptor) -> GateExplanation {
    let mut unmet = Vec::new();

    if let Some(capability) = &gate.capability {
        if !entitlement.capabilities.contains(capability) {
            unmet.push(UnmetClause::MissingCapability {
                capability: capability.clone(),
            });
        }
    }

    if let Some(feature) = &gate.feature {
        if !entitlement.features.contains(feature) {
            unmet.push(UnmetClause::MissingFeature {
                feature: feature.clone(),
            });
        }
    }

    if let Some(required) = gate.needed_plan {
        if !entitlement.plan.satisfies(required) {
            unmet.push(UnmetClause::PlanBelowRequired {
                current: entitlement.plan,
                required,
            });
        }
    }

    let reason = if gate.is_open() {
        "gate has no constraints".to_string()
    } else if unmet.is_empty() {
        format!("role '{}' on plan '{}' satisfies every clause", entitlement.role, entitlement.plan)
    } else {
        unmet.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    };

    GateExplanation {
        allowed: unmet.is_empty(),
        plan: entitlement.plan,
        role: entitlement.role.clone(),
        gate: gate.clone(),
        unmet,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::catalog::Catalogs;
    use crate::resolver::{DefaultReason, EntitlementSource};

    fn entitlement(plan: Plan, role: Role) -> EffectiveEntitlement {
        let catalogs = Catalogs::builtin();
        EffectiveEntitlement {
            plan,
            features: catalogs.plans.features_for_plan(plan).clone(),
            capabilities: catalogs.roles.capabilities_for_role(&role).clone(),
            role,
            source: EntitlementSource::Default {
                reason: DefaultReason::NoMembership,
            },
        }
    }

    fn feature(name: &str) -> Feature {
        Feature::parse(name.to_string()).unwrap()
    }

    fn capability(name: &str) -> Capability {
        Capability::parse(name.to_string()).unwrap()
    }

    #[test]
    fn growth_admin_passes_analytics_gate() {
        let e = entitlement(Plan::Growth, Role::Admin);
        let gate = GateDescriptor::open()
            .feature(feature("analytics.view"))
            .needed_plan(Plan::Starter);
        assert!(allow(&e, &gate));
    }

    #[test]
    fn free_teacher_cannot_create_classes_on_any_plan_clause() {
        let e = entitlement(Plan::Free, Role::Teacher);
        let gate = GateDescriptor::open()
            .capability(capability("classes.create"))
            .needed_plan(Plan::Starter);
        assert!(!allow(&e, &gate));

        let explanation = explain(&e, &gate);
        assert_eq!(
            explanation.unmet,
            vec![
                UnmetClause::MissingCapability {
                    capability: capability("classes.create")
                },
                UnmetClause::PlanBelowRequired {
                    current: Plan::Free,
                    required: Plan::Starter
                },
            ]
        );
    }

    #[test]
    fn open_gate_always_allows() {
        let gate = GateDescriptor::open();
        assert!(gate.is_open());
        for plan in Plan::ORDER {
            for role in Role::KNOWN {
                assert!(allow(&entitlement(plan, role), &gate));
            }
        }
    }

    #[test]
    fn unknown_tags_simply_fail_their_clause() {
        let e = entitlement(Plan::Enterprise, Role::Owner);
        assert!(!allow(&e, &GateDescriptor::open().feature(feature("teleportation"))));
        assert!(!allow(&e, &GateDescriptor::open().capability(capability("moon.land"))));
    }

    #[test]
    fn needed_plan_is_inclusive() {
        let e = entitlement(Plan::Growth, Role::Teacher);
        assert!(allow(&e, &GateDescriptor::open().needed_plan(Plan::Growth)));
        assert!(!allow(&e, &GateDescriptor::open().needed_plan(Plan::Scale)));
    }

    #[test]
    fn explanation_reason_lists_failures() {
        let e = entitlement(Plan::Starter, Role::Parent);
        let gate = GateDescriptor::open().feature(feature("fees.online"));
        let x = explain(&e, &gate);
        assert!(!x.allowed);
        assert_eq!(x.reason, "tenant lacks feature 'fees.online'");
    }

    #[test]
    fn descriptor_json_uses_camel_case() {
        let gate = GateDescriptor::from_json(r#"{"feature":"fees.online","neededPlan":"growth"}"#).unwrap();
        assert_eq!(gate.feature, Some(feature("fees.online")));
        assert_eq!(gate.needed_plan, Some(Plan::Growth));
        assert_eq!(gate.capability, None);

        let json = serde_json::to_string(&GateDescriptor::open().needed_plan(Plan::Scale)).unwrap();
        assert_eq!(json, r#"{"neededPlan":"scale"}"#);
    }

    #[test]
    fn descriptor_json_rejects_unknown_plan_and_bad_tags() {
        let err = GateDescriptor::from_json(r#"{"neededPlan":"platinum"}"#).unwrap_err();
        assert!(matches!(err, ConfigurationError::Malformed(msg) if msg.contains("unknown plan")));

        assert!(GateDescriptor::from_json(r#"{"capability":""}"#).is_err());
        assert!(GateDescriptor::from_json(r#"{"needed_plan":"free"}"#).is_err());
    }

    fn arb_plan() -> impl Strategy<Value = Plan> {
        (0usize..5).prop_map(|i| Plan::ORDER[i])
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![
            (0usize..7).prop_map(|i| Role::KNOWN[i].clone()),
            "[a-z]{3,10}".prop_map(|s| Role::lenient(&s)),
        ]
    }

    fn arb_gate() -> impl Strategy<Value = GateDescriptor> {
        let names = prop::sample::select(vec![
            "classes.create",
            "classes.view",
            "fees.collect",
            "analytics.view",
            "fees.online",
            "sso.saml",
            "dashboard.view",
            "nonexistent.tag",
        ]);
        (
            prop::option::of(names.clone()),
            prop::option::of(names),
            prop::option::of(arb_plan()),
        )
            .prop_map(|(c, f, p)| GateDescriptor {
                capability: c.map(Capability::from_static),
                feature: f.map(Feature::from_static),
                needed_plan: p,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// `allow` is pure and agrees with `explain`.
        #[test]
        fn allow_is_deterministic_and_matches_explain(plan in arb_plan(), role in arb_role(), gate in arb_gate()) {
            let e = entitlement(plan, role);
            let first = allow(&e, &gate);
            prop_assert_eq!(first, allow(&e, &gate));
            let x = explain(&e, &gate);
            prop_assert_eq!(first, x.allowed);
            prop_assert_eq!(x.allowed, x.unmet.is_empty());
        }

        /// Raising the plan never turns an allowed plan-only gate into a denial.
        #[test]
        fn plan_clause_is_monotonic(lo in arb_plan(), hi in arb_plan(), needed in arb_plan()) {
            prop_assume!(lo <= hi);
            let gate = GateDescriptor::open().needed_plan(needed);
            if allow(&entitlement(lo, Role::Teacher), &gate) {
                prop_assert!(allow(&entitlement(hi, Role::Teacher), &gate));
            }
        }
    }
}
