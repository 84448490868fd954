//! Entitlement Resolver: membership + overrides + catalogs -> effective entitlement.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use campusgate_core::{TenantId, UserId};

use crate::catalog::Catalogs;
use crate::claims::{SessionClaims, validate_claims};
use crate::error::{EntitlementError, LookupError};
use crate::membership::{Membership, MembershipDirectory, TenantOverrideStore};
use crate::plan::Plan;
use crate::role::Role;
use crate::tag::{Capability, Feature};

/// What happens when the membership lookup itself fails (as opposed to
/// finding nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MembershipFailurePolicy {
    /// Fall back to the default entitlement and mark it `LookupFailed`.
    #[default]
    FailOpen,
    /// Return [`EntitlementError::MembershipLookup`] to the caller.
    Propagate,
}

/// Why the default entitlement was handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultReason {
    /// The user has no active membership anywhere (e.g. first-run account).
    NoMembership,
    /// The membership backend failed; the user may well have a membership.
    LookupFailed,
}

/// Where an [`EffectiveEntitlement`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntitlementSource {
    Membership { tenant_id: TenantId },
    Default { reason: DefaultReason },
}

/// The resolved `(plan, role, features, capabilities)` of one user.
///
/// Computed fresh per call and owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveEntitlement {
    pub plan: Plan,
    pub role: Role,
    pub features: BTreeSet<Feature>,
    pub capabilities: BTreeSet<Capability>,
    pub source: EntitlementSource,
}

impl EffectiveEntitlement {
    pub fn has_feature(&self, feature: &Feature) -> bool {
        self.features.contains(feature)
    }

    pub fn has_capability(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is_default(&self) -> bool {
        matches!(self.source, EntitlementSource::Default { .. })
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        match self.source {
            EntitlementSource::Membership { tenant_id } => Some(tenant_id),
            EntitlementSource::Default { .. } => None,
        }
    }
}

/// Combines the catalogs with the two external collaborators.
///
/// Holds no mutable state; one instance can serve concurrent requests.
pub struct EntitlementResolver<M, O> {
    catalogs: Catalogs,
    memberships: M,
    overrides: O,
    failure_policy: MembershipFailurePolicy,
}

impl<M, O> EntitlementResolver<M, O>
where
    M: MembershipDirectory,
    O: TenantOverrideStore,
{
    pub fn new(catalogs: Catalogs, memberships: M, overrides: O) -> Self {
        Self {
            catalogs,
            memberships,
            overrides,
            failure_policy: MembershipFailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: MembershipFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    pub fn memberships(&self) -> &M {
        &self.memberships
    }

    pub fn overrides(&self) -> &O {
        &self.overrides
    }

    /// Resolve the effective entitlement of `user_id`.
    ///
    /// Errors only on configuration problems (e.g. an unknown plan stored on
    /// the membership row) or, under [`MembershipFailurePolicy::Propagate`],
    /// on a failed membership lookup.
    pub async fn resolve(&self, user_id: UserId) -> Result<EffectiveEntitlement, EntitlementError> {
        let record = match self.memberships.lookup_active_membership(user_id).await {
            Ok(record) => record,
            Err(err) => return self.on_lookup_failure(user_id, err),
        };

        let membership = match record {
            Some(record) if record.user_id != user_id => {
                tracing::warn!(
                    target: "entitlements",
                    %user_id,
                    returned_user_id = %record.user_id,
                    "membership directory returned a row for another user; ignoring it"
                );
                None
            }
            Some(record) => Membership::from_record(record)?,
            None => None,
        };

        let membership = match membership {
            Some(m) => m,
            None => {
                // Fail open: unaffiliated users get the free/teacher default
                // instead of an empty entitlement. Callers needing strict
                // denial must check membership themselves.
                tracing::debug!(target: "entitlements", %user_id, "no active membership; using default entitlement");
                return Ok(self.default_entitlement(DefaultReason::NoMembership));
            }
        };

        let overrides = self.fetch_overrides(membership.tenant_id).await;

        let mut features = self.catalogs.plans.features_for_plan(membership.plan).clone();
        features.extend(overrides);

        let capabilities = self.catalogs.roles.capabilities_for_role(&membership.role).clone();

        tracing::debug!(
            target: "entitlements",
            %user_id,
            tenant_id = %membership.tenant_id,
            plan = %membership.plan,
            role = %membership.role,
            features = features.len(),
            capabilities = capabilities.len(),
            "resolved entitlement"
        );

        Ok(EffectiveEntitlement {
            plan: membership.plan,
            role: membership.role,
            features,
            capabilities,
            source: EntitlementSource::Membership {
                tenant_id: membership.tenant_id,
            },
        })
    }

    /// Validate a session's time window, then resolve its subject.
    pub async fn resolve_session(
        &self,
        claims: &SessionClaims,
        now: DateTime<Utc>,
    ) -> Result<EffectiveEntitlement, EntitlementError> {
        validate_claims(claims, now)?;
        self.resolve(claims.sub).await
    }

    /// `free` plan, `teacher` role, and the matching catalog sets.
    pub fn default_entitlement(&self, reason: DefaultReason) -> EffectiveEntitlement {
        EffectiveEntitlement {
            plan: Plan::Free,
            role: Role::Teacher,
            features: self.catalogs.plans.features_for_plan(Plan::Free).clone(),
            capabilities: self.catalogs.roles.capabilities_for_role(&Role::Teacher).clone(),
            source: EntitlementSource::Default { reason },
        }
    }

    fn on_lookup_failure(&self, user_id: UserId, err: LookupError) -> Result<EffectiveEntitlement, EntitlementError> {
        match self.failure_policy {
            MembershipFailurePolicy::FailOpen => {
                tracing::warn!(
                    target: "entitlements",
                    %user_id,
                    error = %err,
                    "membership lookup failed; using default entitlement"
                );
                Ok(self.default_entitlement(DefaultReason::LookupFailed))
            }
            MembershipFailurePolicy::Propagate => Err(EntitlementError::MembershipLookup(err)),
        }
    }

    /// Tenant overrides; failures and malformed tags degrade to "no override".
    async fn fetch_overrides(&self, tenant_id: TenantId) -> Vec<Feature> {
        let raw = match self.overrides.list_enabled_features(tenant_id).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(
                    target: "entitlements",
                    %tenant_id,
                    error = %err,
                    "tenant override fetch failed; gating on plan features only"
                );
                return Vec::new();
            }
        };

        raw.into_iter()
            .filter_map(|tag| match Feature::parse(tag) {
                Ok(feature) => Some(feature),
                Err(err) => {
                    tracing::warn!(target: "entitlements", %tenant_id, error = %err, "skipping invalid override tag");
                    None
                }
            })
            .collect()
    }
}
