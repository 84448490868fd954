//! `campusgate-entitlements`: plan/role entitlement resolution and gate evaluation.
//!
//! Everything here is transport- and storage-agnostic. Membership rows and
//! tenant overrides come in through the [`MembershipDirectory`] and
//! [`TenantOverrideStore`] traits; catalogs are immutable values injected at
//! construction time.

pub mod cache;
pub mod catalog;
pub mod claims;
pub mod config;
pub mod consumer;
pub mod error;
pub mod gate;
pub mod membership;
pub mod plan;
pub mod resolver;
pub mod role;
pub mod tag;
pub mod upgrade;

pub use cache::MemoizedResolver;
pub use catalog::{CatalogConfig, Catalogs, PlanCatalog, RoleCapabilityCatalog, SupersetViolation};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use config::EngineConfig;
pub use consumer::{Fallback, GateConsumer, GateRender};
pub use error::{ConfigurationError, EntitlementError, LookupError};
pub use gate::{GateDescriptor, GateExplanation, UnmetClause, allow, explain};
pub use membership::{Membership, MembershipDirectory, MembershipRecord, MembershipStatus, TenantOverrideStore};
pub use plan::Plan;
pub use resolver::{
    DefaultReason, EffectiveEntitlement, EntitlementResolver, EntitlementSource, MembershipFailurePolicy,
};
pub use role::Role;
pub use tag::{Capability, Feature};
pub use upgrade::{UpgradeHint, upgrade_hint};
