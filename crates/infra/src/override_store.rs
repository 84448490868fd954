use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use campusgate_core::TenantId;
use campusgate_entitlements::{LookupError, TenantOverrideStore};

/// In-memory tenant feature overrides for tests/dev.
///
/// Tags are stored as raw strings; the resolver validates them.
#[derive(Debug, Default)]
pub struct InMemoryOverrideStore {
    by_tenant: RwLock<HashMap<TenantId, BTreeSet<String>>>,
    unavailable: AtomicBool,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self, tenant_id: TenantId, feature: impl Into<String>) {
        if let Ok(mut map) = self.by_tenant.write() {
            map.entry(tenant_id).or_default().insert(feature.into());
        }
    }

    pub fn disable(&self, tenant_id: TenantId, feature: &str) {
        if let Ok(mut map) = self.by_tenant.write() {
            if let Some(features) = map.get_mut(&tenant_id) {
                features.remove(feature);
            }
        }
    }

    /// Remove every override for a tenant.
    pub fn clear_tenant(&self, tenant_id: TenantId) {
        if let Ok(mut map) = self.by_tenant.write() {
            map.remove(&tenant_id);
        }
    }

    /// Simulate a backend outage: every fetch fails until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl TenantOverrideStore for InMemoryOverrideStore {
    async fn list_enabled_features(&self, tenant_id: TenantId) -> Result<Vec<String>, LookupError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LookupError::unavailable("override store offline"));
        }

        let map = self
            .by_tenant
            .read()
            .map_err(|_| LookupError::unavailable("override store lock poisoned"))?;

        Ok(map
            .get(&tenant_id)
            .map(|features| features.iter().cloned().collect())
            .unwrap_or_default())
    }
}
