//! Plan and role catalogs.
//!
//! Both catalogs are immutable once built and are shared through [`Catalogs`]
//! (`Arc`s) with every resolver and gate consumer. Nothing in this module is
//! global: alternate catalogs can be injected in tests or loaded from JSON.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::plan::Plan;
use crate::role::Role;
use crate::tag::{Capability, Feature};

// ─────────────────────────────────────────────────────────────────────────────
// Built-in tables
// ─────────────────────────────────────────────────────────────────────────────

/// Features each tier adds on top of the tier below it.
const PLAN_ADDITIONS: [(Plan, &[&str]); 5] = [
    (
        Plan::Free,
        &["dashboard.view", "classes.manage", "students.manage", "notices.manage"],
    ),
    (
        Plan::Starter,
        &["instructors.manage", "fees.manage", "results.manage", "attendance.track"],
    ),
    (
        Plan::Growth,
        &["analytics.view", "fees.online", "admissions.pipeline", "reports.export"],
    ),
    (
        Plan::Scale,
        &["notifications.sms", "campuses.multi", "api.access", "branding.custom"],
    ),
    (
        Plan::Enterprise,
        &["sso.saml", "audit.log", "data.residency", "support.priority"],
    ),
];

const ADMIN_CAPABILITIES: &[&str] = &[
    "classes.create",
    "classes.edit",
    "classes.delete",
    "classes.view",
    "staff.invite",
    "staff.manage",
    "students.enroll",
    "students.view",
    "notices.publish",
    "notices.view",
    "fees.view",
    "fees.collect",
    "results.publish",
    "results.view",
    "admissions.review",
    "reports.view",
    "settings.manage",
];

const OWNER_EXTRA_CAPABILITIES: &[&str] = &["billing.manage", "tenant.delete"];

const TEACHER_CAPABILITIES: &[&str] = &[
    "classes.view",
    "attendance.mark",
    "results.enter",
    "results.view",
    "notices.view",
    "students.view",
];

const ADMISSIONS_CAPABILITIES: &[&str] = &[
    "admissions.review",
    "admissions.decide",
    "students.enroll",
    "students.view",
    "notices.view",
];

const FINANCE_CAPABILITIES: &[&str] = &[
    "fees.view",
    "fees.collect",
    "fees.refund",
    "reports.view",
    "students.view",
    "notices.view",
];

const PARENT_CAPABILITIES: &[&str] = &["notices.view", "results.view", "fees.pay"];

const STUDENT_CAPABILITIES: &[&str] = &["notices.view", "results.view", "classes.view"];

fn static_features<'a>(names: &'a [&'static str]) -> impl Iterator<Item = Feature> + 'a {
    names.iter().copied().map(Feature::from_static)
}

fn static_capabilities<'a>(names: &'a [&'static str]) -> impl Iterator<Item = Capability> + 'a {
    names.iter().copied().map(Capability::from_static)
}

// ─────────────────────────────────────────────────────────────────────────────
// Plan catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Mapping `Plan -> Set<Feature>`.
///
/// Total by construction: one slot per plan, indexed by [`Plan::rank`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCatalog {
    by_plan: [BTreeSet<Feature>; 5],
}

/// A feature present at a lower tier but missing from a higher one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupersetViolation {
    pub lower: Plan,
    pub higher: Plan,
    pub feature: Feature,
}

impl PlanCatalog {
    /// Build a catalog from explicit per-plan feature sets.
    ///
    /// Every plan must appear exactly once. The superset invariant is *not*
    /// enforced here; see [`PlanCatalog::superset_violations`].
    pub fn new<I>(entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (Plan, BTreeSet<Feature>)>,
    {
        let mut slots: [Option<BTreeSet<Feature>>; 5] = Default::default();
        for (plan, features) in entries {
            if slots[plan.rank()].replace(features).is_some() {
                return Err(ConfigurationError::malformed(format!("plan '{plan}' listed twice")));
            }
        }

        let mut by_plan: [BTreeSet<Feature>; 5] = Default::default();
        for plan in Plan::ORDER {
            by_plan[plan.rank()] = slots[plan.rank()]
                .take()
                .ok_or_else(|| ConfigurationError::MissingCatalogEntry(format!("plan '{plan}'")))?;
        }

        Ok(Self { by_plan })
    }

    /// The dashboard's plan table. Each tier is the previous tier plus its additions.
    pub fn builtin() -> Self {
        let mut by_plan: [BTreeSet<Feature>; 5] = Default::default();
        let mut running = BTreeSet::new();
        for (plan, additions) in PLAN_ADDITIONS {
            running.extend(static_features(additions));
            by_plan[plan.rank()] = running.clone();
        }
        Self { by_plan }
    }

    pub fn features_for_plan(&self, plan: Plan) -> &BTreeSet<Feature> {
        &self.by_plan[plan.rank()]
    }

    /// Plans in ascending tier order.
    pub fn plan_order(&self) -> &'static [Plan] {
        &Plan::ORDER
    }

    /// Cheapest plan whose feature set contains `feature`.
    ///
    /// `None` means no plan grants it, which usually indicates a misspelled
    /// feature name at the call site.
    pub fn minimum_plan_for(&self, feature: &Feature) -> Option<Plan> {
        self.plan_order()
            .iter()
            .copied()
            .find(|plan| self.features_for_plan(*plan).contains(feature))
    }

    /// Every place where a higher tier fails to include a lower tier's feature.
    ///
    /// Only adjacent tiers are compared; the relation is transitive.
    pub fn superset_violations(&self) -> Vec<SupersetViolation> {
        let mut violations = Vec::new();
        for pair in self.plan_order().windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            let upper = self.features_for_plan(higher);
            for feature in self.features_for_plan(lower).difference(upper) {
                violations.push(SupersetViolation {
                    lower,
                    higher,
                    feature: feature.clone(),
                });
            }
        }
        violations
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Role capability catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Mapping `Role -> Set<Capability>`, with an explicit fallback for unknown roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCapabilityCatalog {
    by_role: [BTreeSet<Capability>; 7],
}

fn role_slot(role: &Role) -> usize {
    match role {
        Role::Owner => 0,
        Role::Admin => 1,
        Role::Teacher => 2,
        Role::Admissions => 3,
        Role::Finance => 4,
        Role::Parent => 5,
        Role::Student => 6,
        // Unrecognised roles resolve exactly like teachers.
        Role::Unknown(_) => role_slot(&Role::Teacher),
    }
}

impl RoleCapabilityCatalog {
    /// Build a catalog from explicit per-role capability sets.
    ///
    /// All seven known roles must be present and non-empty (teacher's set is
    /// also the fallback for unknown roles). `Role::Unknown` keys are rejected.
    pub fn new<I>(entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (Role, BTreeSet<Capability>)>,
    {
        let mut slots: [Option<BTreeSet<Capability>>; 7] = Default::default();
        for (role, capabilities) in entries {
            if !role.is_known() {
                return Err(ConfigurationError::UnknownRole(role.to_string()));
            }
            if capabilities.is_empty() {
                return Err(ConfigurationError::EmptyRole(role.to_string()));
            }
            if slots[role_slot(&role)].replace(capabilities).is_some() {
                return Err(ConfigurationError::malformed(format!("role '{role}' listed twice")));
            }
        }

        let mut by_role: [BTreeSet<Capability>; 7] = Default::default();
        for role in Role::KNOWN {
            let slot = role_slot(&role);
            by_role[slot] = slots[slot]
                .take()
                .ok_or_else(|| ConfigurationError::MissingCatalogEntry(format!("role '{role}'")))?;
        }

        Ok(Self { by_role })
    }

    /// The dashboard's role table.
    pub fn builtin() -> Self {
        let owner: BTreeSet<Capability> = static_capabilities(ADMIN_CAPABILITIES)
            .chain(static_capabilities(OWNER_EXTRA_CAPABILITIES))
            .collect();

        let table: [(Role, BTreeSet<Capability>); 7] = [
            (Role::Owner, owner),
            (Role::Admin, static_capabilities(ADMIN_CAPABILITIES).collect()),
            (Role::Teacher, static_capabilities(TEACHER_CAPABILITIES).collect()),
            (Role::Admissions, static_capabilities(ADMISSIONS_CAPABILITIES).collect()),
            (Role::Finance, static_capabilities(FINANCE_CAPABILITIES).collect()),
            (Role::Parent, static_capabilities(PARENT_CAPABILITIES).collect()),
            (Role::Student, static_capabilities(STUDENT_CAPABILITIES).collect()),
        ];

        let mut by_role: [BTreeSet<Capability>; 7] = Default::default();
        for (role, capabilities) in table {
            by_role[role_slot(&role)] = capabilities;
        }
        Self { by_role }
    }

    pub fn capabilities_for_role(&self, role: &Role) -> &BTreeSet<Capability> {
        &self.by_role[role_slot(role)]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared bundle + JSON configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Both catalogs behind shared, read-only ownership.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub plans: Arc<PlanCatalog>,
    pub roles: Arc<RoleCapabilityCatalog>,
}

impl Catalogs {
    pub fn new(plans: PlanCatalog, roles: RoleCapabilityCatalog) -> Self {
        Self {
            plans: Arc::new(plans),
            roles: Arc::new(roles),
        }
    }

    pub fn builtin() -> Self {
        Self::new(PlanCatalog::builtin(), RoleCapabilityCatalog::builtin())
    }
}

/// On-disk catalog document.
///
/// ```json
/// { "plans": { "free": ["dashboard.view"], ... },
///   "roles": { "teacher": ["classes.view"], ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    pub plans: BTreeMap<String, Vec<String>>,
    pub roles: BTreeMap<String, Vec<String>>,
}

impl CatalogConfig {
    /// The built-in tables in document form.
    pub fn builtin() -> Self {
        Self::from_catalogs(&PlanCatalog::builtin(), &RoleCapabilityCatalog::builtin())
    }

    pub fn from_catalogs(plans: &PlanCatalog, roles: &RoleCapabilityCatalog) -> Self {
        let plans = Plan::ORDER
            .into_iter()
            .map(|plan| {
                let features = plans.features_for_plan(plan).iter().map(|f| f.to_string()).collect();
                (plan.to_string(), features)
            })
            .collect();

        let roles = Role::KNOWN
            .into_iter()
            .map(|role| {
                let caps = roles.capabilities_for_role(&role).iter().map(|c| c.to_string()).collect();
                (role.to_string(), caps)
            })
            .collect();

        Self { plans, roles }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(raw).map_err(|e| ConfigurationError::malformed(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::malformed(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    /// Validate every key and tag and build the catalogs.
    pub fn into_catalogs(self) -> Result<Catalogs, ConfigurationError> {
        let mut plan_entries = Vec::with_capacity(self.plans.len());
        for (name, features) in self.plans {
            let plan: Plan = name.parse()?;
            let features = features
                .into_iter()
                .map(Feature::parse)
                .collect::<Result<BTreeSet<_>, _>>()?;
            plan_entries.push((plan, features));
        }

        let mut role_entries = Vec::with_capacity(self.roles.len());
        for (name, capabilities) in self.roles {
            let role = Role::parse_strict(&name)?;
            let capabilities = capabilities
                .into_iter()
                .map(Capability::parse)
                .collect::<Result<BTreeSet<_>, _>>()?;
            role_entries.push((role, capabilities));
        }

        let plans = PlanCatalog::new(plan_entries)?;
        for violation in plans.superset_violations() {
            tracing::warn!(
                target: "entitlements",
                lower = %violation.lower,
                higher = %violation.higher,
                feature = %violation.feature,
                "plan catalog breaks the superset invariant"
            );
        }

        Ok(Catalogs::new(plans, RoleCapabilityCatalog::new(role_entries)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feature(name: &str) -> Feature {
        Feature::parse(name.to_string()).unwrap()
    }

    fn capability(name: &str) -> Capability {
        Capability::parse(name.to_string()).unwrap()
    }

    #[test]
    fn builtin_tags_are_all_valid() {
        let plans = PlanCatalog::builtin();
        for plan in Plan::ORDER {
            for f in plans.features_for_plan(plan) {
                assert!(Feature::parse(f.to_string()).is_ok(), "bad feature tag {f}");
            }
        }
        let roles = RoleCapabilityCatalog::builtin();
        for role in Role::KNOWN {
            for c in roles.capabilities_for_role(&role) {
                assert!(Capability::parse(c.to_string()).is_ok(), "bad capability tag {c}");
            }
        }
    }

    #[test]
    fn builtin_plan_catalog_has_no_superset_violations() {
        assert!(PlanCatalog::builtin().superset_violations().is_empty());
    }

    #[test]
    fn every_builtin_role_grants_something() {
        let roles = RoleCapabilityCatalog::builtin();
        for role in Role::KNOWN {
            assert!(!roles.capabilities_for_role(&role).is_empty(), "{role} is empty");
        }
    }

    #[test]
    fn unknown_role_uses_teacher_capabilities() {
        let roles = RoleCapabilityCatalog::builtin();
        assert_eq!(
            roles.capabilities_for_role(&Role::Unknown("janitor".into())),
            roles.capabilities_for_role(&Role::Teacher)
        );
    }

    #[test]
    fn teacher_cannot_create_classes() {
        let roles = RoleCapabilityCatalog::builtin();
        assert!(!roles.capabilities_for_role(&Role::Teacher).contains(&capability("classes.create")));
        assert!(roles.capabilities_for_role(&Role::Admin).contains(&capability("classes.create")));
    }

    #[test]
    fn owner_is_admin_plus_billing() {
        let roles = RoleCapabilityCatalog::builtin();
        let owner = roles.capabilities_for_role(&Role::Owner);
        let admin = roles.capabilities_for_role(&Role::Admin);
        assert!(owner.is_superset(admin));
        assert!(owner.contains(&capability("billing.manage")));
        assert!(!admin.contains(&capability("billing.manage")));
    }

    #[test]
    fn minimum_plan_lookup() {
        let plans = PlanCatalog::builtin();
        assert_eq!(plans.minimum_plan_for(&feature("dashboard.view")), Some(Plan::Free));
        assert_eq!(plans.minimum_plan_for(&feature("analytics.view")), Some(Plan::Growth));
        assert_eq!(plans.minimum_plan_for(&feature("sso.saml")), Some(Plan::Enterprise));
        assert_eq!(plans.minimum_plan_for(&feature("teleportation")), None);
    }

    #[test]
    fn starter_lacks_online_fees() {
        let plans = PlanCatalog::builtin();
        assert!(!plans.features_for_plan(Plan::Starter).contains(&feature("fees.online")));
        assert!(plans.features_for_plan(Plan::Growth).contains(&feature("fees.online")));
    }

    #[test]
    fn superset_violations_are_reported() {
        let mut entries: Vec<(Plan, BTreeSet<Feature>)> = Plan::ORDER
            .into_iter()
            .map(|p| (p, PlanCatalog::builtin().features_for_plan(p).clone()))
            .collect();
        entries[3].1.remove(&feature("analytics.view"));

        let catalog = PlanCatalog::new(entries).unwrap();
        let violations = catalog.superset_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].lower, Plan::Growth);
        assert_eq!(violations[0].higher, Plan::Scale);
        assert_eq!(violations[0].feature, feature("analytics.view"));
    }

    #[test]
    fn plan_catalog_requires_every_plan() {
        let entries = vec![(Plan::Free, BTreeSet::new())];
        assert!(matches!(
            PlanCatalog::new(entries),
            Err(ConfigurationError::MissingCatalogEntry(_))
        ));
    }

    #[test]
    fn role_catalog_rejects_empty_role() {
        let mut entries: Vec<(Role, BTreeSet<Capability>)> = Role::KNOWN
            .into_iter()
            .map(|r| {
                let caps = RoleCapabilityCatalog::builtin().capabilities_for_role(&r).clone();
                (r, caps)
            })
            .collect();
        entries[5].1.clear();
        assert_eq!(
            RoleCapabilityCatalog::new(entries),
            Err(ConfigurationError::EmptyRole("parent".into()))
        );
    }

    #[test]
    fn config_document_round_trips_builtin_tables() {
        let json = serde_json::to_string(&CatalogConfig::builtin()).unwrap();
        let catalogs = CatalogConfig::from_json(&json).unwrap().into_catalogs().unwrap();
        assert_eq!(*catalogs.plans, PlanCatalog::builtin());
        assert_eq!(*catalogs.roles, RoleCapabilityCatalog::builtin());
    }

    #[test]
    fn config_rejects_unknown_plan_key() {
        let mut config = CatalogConfig::builtin();
        config.plans.insert("platinum".into(), vec!["x.y".into()]);
        assert_eq!(
            config.into_catalogs().unwrap_err(),
            ConfigurationError::UnknownPlan("platinum".into())
        );
    }

    #[test]
    fn config_rejects_unknown_role_key() {
        let mut config = CatalogConfig::builtin();
        config.roles.insert("janitor".into(), vec!["mop.floor".into()]);
        assert_eq!(
            config.into_catalogs().unwrap_err(),
            ConfigurationError::UnknownRole("janitor".into())
        );
    }

    #[test]
    fn config_rejects_missing_role() {
        let mut config = CatalogConfig::builtin();
        config.roles.remove("student");
        assert!(matches!(
            config.into_catalogs(),
            Err(ConfigurationError::MissingCatalogEntry(msg)) if msg.contains("student")
        ));
    }

    #[test]
    fn config_rejects_unknown_fields() {
        let err = CatalogConfig::from_json(r#"{"plans":{},"roles":{},"extras":{}}"#).unwrap_err();
        assert!(matches!(err, ConfigurationError::Malformed(_)));
    }

    proptest! {
        /// For every pair of plans in ascending order, the lower plan's
        /// features are a subset of the higher plan's.
        #[test]
        fn builtin_features_grow_with_rank(a in 0usize..5, b in 0usize..5) {
            let plans = PlanCatalog::builtin();
            let (lo, hi) = (a.min(b), a.max(b));
            let lower = plans.features_for_plan(Plan::ORDER[lo]);
            let higher = plans.features_for_plan(Plan::ORDER[hi]);
            prop_assert!(lower.is_subset(higher));
        }

        /// The minimum plan for any catalog feature actually grants it, and
        /// no cheaper plan does.
        #[test]
        fn minimum_plan_is_cheapest_granting_plan(plan_idx in 0usize..5, pick in any::<prop::sample::Index>()) {
            let plans = PlanCatalog::builtin();
            let features: Vec<&Feature> = plans.features_for_plan(Plan::ORDER[plan_idx]).iter().collect();
            let f = pick.get(&features);
            let min = plans.minimum_plan_for(f).unwrap();
            prop_assert!(plans.features_for_plan(min).contains(*f));
            prop_assert!(min.rank() <= plan_idx);
            for cheaper in &Plan::ORDER[..min.rank()] {
                prop_assert!(!plans.features_for_plan(*cheaper).contains(*f));
            }
        }
    }
}
