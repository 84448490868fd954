use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use campusgate_core::{TenantId, UserId};
use campusgate_entitlements::{LookupError, MembershipDirectory, MembershipRecord, MembershipStatus};

/// In-memory membership table for tests/dev.
///
/// A user may hold rows in several tenants; the first *active* row in
/// insertion order wins. Rows are stored verbatim (strings unvalidated) so
/// bad data reaches the resolver exactly as a real table would deliver it.
#[derive(Debug, Default)]
pub struct InMemoryMembershipDirectory {
    rows: RwLock<HashMap<UserId, Vec<MembershipRecord>>>,
    unavailable: AtomicBool,
}

impl InMemoryMembershipDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = MembershipRecord>) -> Self {
        let dir = Self::new();
        for record in records {
            dir.upsert(record);
        }
        dir
    }

    /// Insert a row, replacing any existing row for the same `(user, tenant)`.
    pub fn upsert(&self, record: MembershipRecord) {
        if let Ok(mut map) = self.rows.write() {
            let rows = map.entry(record.user_id).or_default();
            match rows.iter_mut().find(|r| r.tenant_id == record.tenant_id) {
                Some(existing) => *existing = record,
                None => rows.push(record),
            }
        }
    }

    pub fn remove(&self, user_id: UserId, tenant_id: TenantId) {
        if let Ok(mut map) = self.rows.write() {
            if let Some(rows) = map.get_mut(&user_id) {
                rows.retain(|r| r.tenant_id != tenant_id);
            }
        }
    }

    /// Simulate a backend outage: every lookup fails until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|m| m.values().map(Vec::len).sum()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MembershipDirectory for InMemoryMembershipDirectory {
    async fn lookup_active_membership(&self, user_id: UserId) -> Result<Option<MembershipRecord>, LookupError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LookupError::unavailable("membership table offline"));
        }

        let map = self
            .rows
            .read()
            .map_err(|_| LookupError::unavailable("membership table lock poisoned"))?;

        Ok(map.get(&user_id).and_then(|rows| {
            rows.iter()
                .find(|r| MembershipStatus::parse(&r.status).is_active())
                .cloned()
        }))
    }
}
