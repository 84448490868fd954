//! Optional memoization of resolved entitlements.
//!
//! Entries are keyed by `(user_id, entitlement_version)`. Administration bumps
//! the version whenever plan, role or overrides change, so a session carrying
//! a newer version always triggers a fresh resolution.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use campusgate_core::UserId;

use crate::claims::{SessionClaims, validate_claims};
use crate::error::EntitlementError;
use crate::membership::{MembershipDirectory, TenantOverrideStore};
use crate::resolver::{DefaultReason, EffectiveEntitlement, EntitlementResolver, EntitlementSource};

pub struct MemoizedResolver<M, O> {
    inner: EntitlementResolver<M, O>,
    entries: RwLock<HashMap<(UserId, u64), EffectiveEntitlement>>,
}

impl<M, O> MemoizedResolver<M, O>
where
    M: MembershipDirectory,
    O: TenantOverrideStore,
{
    pub fn new(inner: EntitlementResolver<M, O>) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &EntitlementResolver<M, O> {
        &self.inner
    }

    /// Resolve through the cache.
    ///
    /// Results produced because the membership lookup failed are returned but
    /// never stored, so a transient outage does not pin the user to the default.
    pub async fn resolve(&self, user_id: UserId, version: u64) -> Result<EffectiveEntitlement, EntitlementError> {
        if let Some(hit) = self.cached(user_id, version) {
            return Ok(hit);
        }

        let resolved = self.inner.resolve(user_id).await?;

        let degraded = resolved.source
            == EntitlementSource::Default {
                reason: DefaultReason::LookupFailed,
            };
        if !degraded {
            // A poisoned lock only costs us the memoization.
            // Older versions go; a newer entry written by a concurrent request stays.
            if let Ok(mut map) = self.entries.write() {
                map.retain(|(u, v), _| *u != user_id || *v > version);
                map.insert((user_id, version), resolved.clone());
            }
        }

        Ok(resolved)
    }

    pub async fn resolve_session(
        &self,
        claims: &SessionClaims,
        now: DateTime<Utc>,
    ) -> Result<EffectiveEntitlement, EntitlementError> {
        validate_claims(claims, now)?;
        self.resolve(claims.sub, claims.entitlement_version).await
    }

    /// Drop every cached entry for `user_id`.
    pub fn invalidate(&self, user_id: UserId) {
        if let Ok(mut map) = self.entries.write() {
            map.retain(|(u, _), _| *u != user_id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, user_id: UserId, version: u64) -> Option<EffectiveEntitlement> {
        let map = self.entries.read().ok()?;
        map.get(&(user_id, version)).cloned()
    }
}
