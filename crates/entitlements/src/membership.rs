use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use campusgate_core::{TenantId, UserId};

use crate::error::{ConfigurationError, LookupError};
use crate::plan::Plan;
use crate::role::Role;

/// A tenant-membership row exactly as the membership table stores it.
///
/// Plan, role and status are still plain strings here; [`Membership::from_record`]
/// is the validation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub plan: String,
    pub role: String,
    pub status: String,
}

/// Lifecycle state of a membership. Only `Active` is honoured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Invited,
    Suspended,
    /// Any other stored value; treated as inactive.
    Unrecognised(String),
}

impl MembershipStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "active" => Self::Active,
            "invited" => Self::Invited,
            "suspended" => Self::Suspended,
            other => Self::Unrecognised(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A validated, active membership: which tenant the user acts in, on which
/// plan, as which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub plan: Plan,
    pub role: Role,
}

impl Membership {
    /// Validate a stored row.
    ///
    /// A row that is not active yields `Ok(None)` whatever its plan and role
    /// say. For active rows an unknown plan is a [`ConfigurationError`], and an
    /// unknown role is kept as [`Role::Unknown`] (it resolves to teacher
    /// capabilities) and logged.
    pub fn from_record(record: MembershipRecord) -> Result<Option<Self>, ConfigurationError> {
        let status = MembershipStatus::parse(&record.status);
        if !status.is_active() {
            tracing::debug!(
                target: "entitlements",
                user_id = %record.user_id,
                tenant_id = %record.tenant_id,
                status = %record.status,
                "membership is not active; ignoring it"
            );
            return Ok(None);
        }

        let plan: Plan = record.plan.parse()?;
        let role = Role::lenient(&record.role);
        if !role.is_known() {
            tracing::warn!(
                target: "entitlements",
                user_id = %record.user_id,
                tenant_id = %record.tenant_id,
                role = %role,
                "unrecognised role on membership; falling back to teacher capabilities"
            );
        }

        Ok(Some(Self {
            user_id: record.user_id,
            tenant_id: record.tenant_id,
            plan,
            role,
        }))
    }
}

/// Membership Resolver: finds the active tenant membership of a user.
///
/// `Ok(None)` means "no active membership" and is not an error. `Err` is an
/// infrastructure failure; implementations must keep the two apart.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn lookup_active_membership(&self, user_id: UserId) -> Result<Option<MembershipRecord>, LookupError>;
}

/// Tenant Feature Override Store: features a tenant has outside its plan.
#[async_trait]
pub trait TenantOverrideStore: Send + Sync {
    async fn list_enabled_features(&self, tenant_id: TenantId) -> Result<Vec<String>, LookupError>;
}

#[async_trait]
impl<T> MembershipDirectory for Arc<T>
where
    T: MembershipDirectory + ?Sized,
{
    async fn lookup_active_membership(&self, user_id: UserId) -> Result<Option<MembershipRecord>, LookupError> {
        (**self).lookup_active_membership(user_id).await
    }
}

#[async_trait]
impl<T> TenantOverrideStore for Arc<T>
where
    T: TenantOverrideStore + ?Sized,
{
    async fn list_enabled_features(&self, tenant_id: TenantId) -> Result<Vec<String>, LookupError> {
        (**self).list_enabled_features(tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(plan: &str, role: &str, status: &str) -> MembershipRecord {
        MembershipRecord {
            user_id: UserId::new(),
            tenant_id: TenantId::new(),
            plan: plan.to_string(),
            role: role.to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn valid_record_converts() {
        let m = Membership::from_record(record("growth", "admin", "active")).unwrap().unwrap();
        assert_eq!(m.plan, Plan::Growth);
        assert_eq!(m.role, Role::Admin);
    }

    #[test]
    fn inactive_row_is_skipped_before_plan_validation() {
        for status in ["suspended", "invited", "archived"] {
            assert_eq!(Membership::from_record(record("platinum", "admin", status)), Ok(None));
        }
    }

    #[test]
    fn unknown_plan_is_rejected() {
        let err = Membership::from_record(record("premium", "admin", "active")).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownPlan("premium".into()));
    }

    #[test]
    fn unknown_role_is_kept() {
        let m = Membership::from_record(record("free", "librarian", "active")).unwrap().unwrap();
        assert_eq!(m.role, Role::Unknown("librarian".into()));
    }

    #[test]
    fn only_active_status_is_active() {
        assert!(MembershipStatus::parse("active").is_active());
        assert!(!MembershipStatus::parse("invited").is_active());
        assert!(!MembershipStatus::parse("suspended").is_active());
        assert_eq!(
            MembershipStatus::parse("archived"),
            MembershipStatus::Unrecognised("archived".into())
        );
    }
}
