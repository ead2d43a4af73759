//! In-memory policy store.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use tracing::debug;
use vellum_types::{DsoRef, EPersonId, GroupId, PolicyId, Principal};

use crate::error::{Result, StoreError};
use crate::policy::{NewPolicy, ResourcePolicy, check_window};
use crate::store::{PolicyStore, PolicyWrite};

/// [`PolicyStore`] backed by ordered maps behind a single `RwLock`.
///
/// Bulk operations take the write lock once and hold it until done, so a
/// reader sees either the state before or the state after.
#[derive(Debug)]
pub struct InMemoryPolicyStore {
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    next_id: PolicyId,
    policies: BTreeMap<PolicyId, ResourcePolicy>,
    by_resource: HashMap<DsoRef, BTreeSet<PolicyId>>,
}

impl Inner {
    fn empty() -> Self {
        Self {
            next_id: PolicyId::new(1),
            policies: BTreeMap::new(),
            by_resource: HashMap::new(),
        }
    }

    fn put(&mut self, policy: ResourcePolicy) -> Result<()> {
        if policy.id() >= self.next_id {
            self.next_id = policy
                .id()
                .next()
                .ok_or(StoreError::IdsExhausted(policy.id()))?;
        }
        self.by_resource
            .entry(policy.resource())
            .or_default()
            .insert(policy.id());
        self.policies.insert(policy.id(), policy);
        Ok(())
    }

    fn insert_new(&mut self, draft: NewPolicy) -> Result<ResourcePolicy> {
        check_window(draft.start_date, draft.end_date)?;
        let policy = draft.into_policy(self.next_id);
        self.put(policy.clone())?;
        Ok(policy)
    }

    fn remove(&mut self, id: PolicyId) -> Option<ResourcePolicy> {
        let policy = self.policies.remove(&id)?;
        if let Some(ids) = self.by_resource.get_mut(&policy.resource()) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_resource.remove(&policy.resource());
            }
        }
        Some(policy)
    }

    fn ids_for(&self, resource: DsoRef) -> Vec<PolicyId> {
        self.by_resource
            .get(&resource)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    fn for_resource(&self, resource: DsoRef) -> Vec<ResourcePolicy> {
        self.ids_for(resource)
            .into_iter()
            .filter_map(|id| self.policies.get(&id).cloned())
            .collect()
    }

    fn retain_resource(&mut self, resource: DsoRef, keep: &dyn Fn(&ResourcePolicy) -> bool) -> usize {
        let doomed: Vec<PolicyId> = self
            .for_resource(resource)
            .iter()
            .filter(|p| !keep(p))
            .map(ResourcePolicy::id)
            .collect();
        for id in &doomed {
            self.remove(*id);
        }
        doomed.len()
    }

    fn remove_where(&mut self, pred: impl Fn(&ResourcePolicy) -> bool) -> usize {
        let doomed: Vec<PolicyId> = self
            .policies
            .values()
            .filter(|p| pred(p))
            .map(ResourcePolicy::id)
            .collect();
        for id in &doomed {
            self.remove(*id);
        }
        doomed.len()
    }
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::empty()),
        }
    }

    /// Rebuilds a store from previously exported records, keeping their ids.
    /// New ids continue after the highest one seen.
    pub fn from_policies(policies: impl IntoIterator<Item = ResourcePolicy>) -> Result<Self> {
        let mut inner = Inner::empty();
        for policy in policies {
            check_window(policy.start_date(), policy.end_date())?;
            inner.remove(policy.id());
            inner.put(policy)?;
        }
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.policies.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn insert(&self, policy: NewPolicy) -> Result<ResourcePolicy> {
        let mut inner = self.write()?;
        let policy = inner.insert_new(policy)?;
        debug!(policy_id = %policy.id(), resource = %policy.resource(), action = %policy.action(), "policy inserted");
        Ok(policy)
    }

    fn update(&self, policy: &ResourcePolicy) -> Result<()> {
        check_window(policy.start_date(), policy.end_date())?;
        let mut inner = self.write()?;
        if inner.remove(policy.id()).is_none() {
            return Err(StoreError::NotFound(policy.id()));
        }
        inner.put(policy.clone())
    }

    fn get(&self, id: PolicyId) -> Result<Option<ResourcePolicy>> {
        Ok(self.read()?.policies.get(&id).cloned())
    }

    fn delete(&self, id: PolicyId) -> Result<()> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn find_by_resource(&self, resource: DsoRef) -> Result<Vec<ResourcePolicy>> {
        Ok(self.read()?.for_resource(resource))
    }

    fn find_by_group(&self, group: GroupId) -> Result<Vec<ResourcePolicy>> {
        let inner = self.read()?;
        Ok(inner
            .policies
            .values()
            .filter(|p| p.principal() == Principal::Group(group))
            .cloned()
            .collect())
    }

    fn find_by_actor(&self, actor: EPersonId) -> Result<Vec<ResourcePolicy>> {
        let inner = self.read()?;
        Ok(inner
            .policies
            .values()
            .filter(|p| p.principal() == Principal::Actor(actor))
            .cloned()
            .collect())
    }

    fn replace(
        &self,
        resource: DsoRef,
        keep: &dyn Fn(&ResourcePolicy) -> bool,
        additions: Vec<NewPolicy>,
    ) -> Result<Vec<ResourcePolicy>> {
        // Validate before touching anything so a bad draft leaves no trace.
        for draft in &additions {
            check_window(draft.start_date, draft.end_date)?;
        }
        let mut inner = self.write()?;
        let removed = inner.retain_resource(resource, keep);
        let mut inserted = Vec::with_capacity(additions.len());
        for mut draft in additions {
            draft.resource = resource;
            inserted.push(inner.insert_new(draft)?);
        }
        debug!(%resource, removed, inserted = inserted.len(), "policies replaced");
        Ok(inserted)
    }

    fn write_batch(&self, writes: Vec<PolicyWrite>) -> Result<Vec<ResourcePolicy>> {
        for write in &writes {
            match write {
                PolicyWrite::Insert(draft) => check_window(draft.start_date, draft.end_date)?,
                PolicyWrite::Update(policy) => check_window(policy.start_date(), policy.end_date())?,
            }
        }
        let mut inner = self.write()?;
        for write in &writes {
            if let PolicyWrite::Update(policy) = write {
                if !inner.policies.contains_key(&policy.id()) {
                    return Err(StoreError::NotFound(policy.id()));
                }
            }
        }

        let mut written = Vec::with_capacity(writes.len());
        for write in writes {
            match write {
                PolicyWrite::Insert(draft) => written.push(inner.insert_new(draft)?),
                PolicyWrite::Update(policy) => {
                    inner.remove(policy.id());
                    inner.put(policy.clone())?;
                    written.push(policy);
                }
            }
        }
        debug!(written = written.len(), "policy batch written");
        Ok(written)
    }

    fn retain(&self, resource: DsoRef, keep: &dyn Fn(&ResourcePolicy) -> bool) -> Result<usize> {
        let removed = self.write()?.retain_resource(resource, keep);
        debug!(%resource, removed, "policies removed");
        Ok(removed)
    }

    fn delete_by_group(&self, group: GroupId) -> Result<usize> {
        let removed = self
            .write()?
            .remove_where(|p| p.principal() == Principal::Group(group));
        debug!(%group, removed, "group policies removed");
        Ok(removed)
    }

    fn delete_by_actor(&self, actor: EPersonId) -> Result<usize> {
        let removed = self
            .write()?
            .remove_where(|p| p.principal() == Principal::Actor(actor));
        debug!(%actor, removed, "actor policies removed");
        Ok(removed)
    }

    fn snapshot(&self) -> Result<Vec<ResourcePolicy>> {
        Ok(self.read()?.policies.values().cloned().collect())
    }
}
