//! The policy storage seam.

use vellum_types::{Action, DsoRef, EPersonId, GroupId, PolicyId, PolicyType, Principal};

use crate::error::Result;
use crate::policy::{NewPolicy, ResourcePolicy};

/// One write in a [`PolicyStore::write_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyWrite {
    /// Store a new record.
    Insert(NewPolicy),
    /// Overwrite the stored record with the same id.
    Update(ResourcePolicy),
}

/// CRUD and structured lookup over policy records.
///
/// Results are ordered by policy id. Every bulk operation is atomic with
/// respect to concurrent readers: nobody observes a half-applied delete or
/// replacement.
pub trait PolicyStore: Send + Sync {
    /// Stores a draft and returns it with its assigned id.
    fn insert(&self, policy: NewPolicy) -> Result<ResourcePolicy>;

    /// Overwrites the stored record with the same id.
    fn update(&self, policy: &ResourcePolicy) -> Result<()>;

    fn get(&self, id: PolicyId) -> Result<Option<ResourcePolicy>>;

    fn delete(&self, id: PolicyId) -> Result<()>;

    fn find_by_resource(&self, resource: DsoRef) -> Result<Vec<ResourcePolicy>>;

    fn find_by_group(&self, group: GroupId) -> Result<Vec<ResourcePolicy>>;

    fn find_by_actor(&self, actor: EPersonId) -> Result<Vec<ResourcePolicy>>;

    /// Keeps the policies of `resource` for which `keep` holds, drops the rest,
    /// and inserts `additions`, all under one lock. Returns the inserted records.
    fn replace(
        &self,
        resource: DsoRef,
        keep: &dyn Fn(&ResourcePolicy) -> bool,
        additions: Vec<NewPolicy>,
    ) -> Result<Vec<ResourcePolicy>>;

    /// Applies every write under one lock, or none of them. Windows and the
    /// targets of updates are checked before anything changes. Returns the
    /// written records in order.
    fn write_batch(&self, writes: Vec<PolicyWrite>) -> Result<Vec<ResourcePolicy>>;

    /// Removes the policies of `resource` for which `keep` is false.
    /// Returns how many were removed.
    fn retain(&self, resource: DsoRef, keep: &dyn Fn(&ResourcePolicy) -> bool) -> Result<usize>;

    fn delete_by_group(&self, group: GroupId) -> Result<usize>;

    fn delete_by_actor(&self, actor: EPersonId) -> Result<usize>;

    /// Every stored policy, ordered by id.
    fn snapshot(&self) -> Result<Vec<ResourcePolicy>>;

    // ------------------------------------------------------------------------
    // Derived lookups
    // ------------------------------------------------------------------------

    fn find_by_resource_and_action(
        &self,
        resource: DsoRef,
        action: Action,
    ) -> Result<Vec<ResourcePolicy>> {
        let mut policies = self.find_by_resource(resource)?;
        policies.retain(|p| p.action() == action);
        Ok(policies)
    }

    fn find_by_resource_and_type(
        &self,
        resource: DsoRef,
        policy_type: PolicyType,
    ) -> Result<Vec<ResourcePolicy>> {
        let mut policies = self.find_by_resource(resource)?;
        policies.retain(|p| p.policy_type() == policy_type);
        Ok(policies)
    }

    /// The lowest-id policy granting `action` on `resource` to `principal`,
    /// ignoring the policy `excluding`. Used to refresh a grant in place
    /// instead of duplicating it.
    fn find_first_match(
        &self,
        resource: DsoRef,
        principal: Principal,
        action: Action,
        excluding: Option<PolicyId>,
    ) -> Result<Option<ResourcePolicy>> {
        Ok(self
            .find_by_resource_and_action(resource, action)?
            .into_iter()
            .find(|p| p.principal() == principal && Some(p.id()) != excluding))
    }

    // ------------------------------------------------------------------------
    // Derived bulk removal
    // ------------------------------------------------------------------------

    fn delete_by_resource(&self, resource: DsoRef) -> Result<usize> {
        self.retain(resource, &|_| false)
    }

    fn delete_by_resource_and_action(&self, resource: DsoRef, action: Action) -> Result<usize> {
        self.retain(resource, &|p| p.action() != action)
    }

    fn delete_by_resource_and_type(
        &self,
        resource: DsoRef,
        policy_type: PolicyType,
    ) -> Result<usize> {
        self.retain(resource, &|p| p.policy_type() != policy_type)
    }

    fn delete_by_resource_and_group(&self, resource: DsoRef, group: GroupId) -> Result<usize> {
        self.retain(resource, &|p| p.principal() != Principal::Group(group))
    }

    fn delete_by_resource_and_actor(&self, resource: DsoRef, actor: EPersonId) -> Result<usize> {
        self.retain(resource, &|p| p.principal() != Principal::Actor(actor))
    }

    /// Removes every policy of `resource` except those tagged `policy_type`.
    fn delete_by_resource_except_type(
        &self,
        resource: DsoRef,
        policy_type: PolicyType,
    ) -> Result<usize> {
        self.retain(resource, &|p| p.policy_type() == policy_type)
    }
}
