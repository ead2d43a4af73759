//! Policy maintenance on behalf of the content layer.
//!
//! These operations do not check permissions themselves; callers run the
//! matching cascade check first.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info};
use vellum_policy::{NewPolicy, PolicyStore, PolicyWrite, ResourcePolicy};
use vellum_types::{Action, DsoRef, EPersonId, GroupId, PolicyType, Principal};

use crate::context::Context;
use crate::error::{AuthorizeError, Result};
use crate::hierarchy::Containment;

/// Actions handed out when an item enters submission or workflow.
const SUBMISSION_ACTIONS: [Action; 4] = [Action::Read, Action::Write, Action::Add, Action::Remove];

pub struct PolicyService<'a> {
    store: &'a dyn PolicyStore,
    graph: &'a dyn Containment,
}

impl<'a> PolicyService<'a> {
    pub fn new(store: &'a dyn PolicyStore, graph: &'a dyn Containment) -> Self {
        Self { store, graph }
    }

    pub fn add_policy(
        &self,
        ctx: &Context,
        object: DsoRef,
        action: Action,
        principal: Principal,
        policy_type: PolicyType,
    ) -> Result<ResourcePolicy> {
        let policy = self
            .store
            .insert(NewPolicy::new(object, action, principal).policy_type(policy_type))?;
        debug!(%object, %action, %principal, user = ?ctx.current_user(), "policy added");
        Ok(policy)
    }

    /// Writes a `Custom` grant of `action` on `object` to `principal`, reusing
    /// a stored record where one exists.
    ///
    /// See [`plan_policy`](Self::plan_policy) for which record is reused.
    pub fn create_or_modify_policy(
        &self,
        existing: Option<ResourcePolicy>,
        ctx: &Context,
        principal: Principal,
        name: Option<String>,
        end_date: Option<NaiveDate>,
        action: Action,
        reason: Option<String>,
        object: DsoRef,
    ) -> Result<ResourcePolicy> {
        match self.plan_policy(existing, principal, name, end_date, action, reason, object)? {
            PolicyWrite::Update(policy) => {
                self.store.update(&policy)?;
                debug!(policy_id = %policy.id(), %object, user = ?ctx.current_user(), "policy modified");
                Ok(policy)
            }
            PolicyWrite::Insert(draft) => {
                let policy = self.store.insert(draft)?;
                debug!(policy_id = %policy.id(), %object, user = ?ctx.current_user(), "policy created");
                Ok(policy)
            }
        }
    }

    /// Works out the write [`create_or_modify_policy`](Self::create_or_modify_policy)
    /// would make, without making it.
    ///
    /// An existing grant for the same `(object, principal, action)` is updated
    /// in place; otherwise `existing` is rewritten; otherwise a new record is
    /// inserted. `existing`, when given, must target `object`. A reused record
    /// whose start date falls after `end_date` loses its start date.
    pub fn plan_policy(
        &self,
        existing: Option<ResourcePolicy>,
        principal: Principal,
        name: Option<String>,
        end_date: Option<NaiveDate>,
        action: Action,
        reason: Option<String>,
        object: DsoRef,
    ) -> Result<PolicyWrite> {
        if let Some(policy) = &existing {
            if policy.resource() != object {
                return Err(AuthorizeError::invariant(format!(
                    "policy {} targets {}, not {object}",
                    policy.id(),
                    policy.resource()
                )));
            }
        }
        let excluding = existing.as_ref().map(ResourcePolicy::id);
        let matched = self
            .store
            .find_first_match(object, principal, action, excluding)?;

        Ok(match matched.or(existing) {
            Some(policy) => {
                let start_date = policy
                    .start_date()
                    .filter(|start| end_date.is_none_or(|end| *start <= end));
                PolicyWrite::Update(
                    policy
                        .with_principal(principal)
                        .with_action(action)
                        .with_start_date(start_date)
                        .with_end_date(end_date)
                        .with_name(name)
                        .with_description(reason)
                        .with_policy_type(PolicyType::Custom),
                )
            }
            None => {
                let mut draft = NewPolicy::new(object, action, principal);
                draft.end_date = end_date;
                draft.name = name;
                draft.description = reason;
                PolicyWrite::Insert(draft)
            }
        })
    }

    /// Groups holding an active `action` grant on `object`, ascending.
    pub fn authorized_groups(
        &self,
        ctx: &Context,
        object: DsoRef,
        action: Action,
    ) -> Result<Vec<GroupId>> {
        let today = ctx.today();
        let groups: BTreeSet<GroupId> = self
            .store
            .find_by_resource_and_action(object, action)?
            .iter()
            .filter(|p| p.is_active_on(today))
            .filter_map(|p| p.principal().group())
            .collect();
        Ok(groups.into_iter().collect())
    }

    /// Resets `item` and its content to the collection's default read access.
    ///
    /// Every non-`Custom` policy of the item is replaced by `Inherited` READ
    /// grants for the collection's DEFAULT_ITEM_READ groups; bundles and
    /// bitstreams get the DEFAULT_BITSTREAM_READ groups the same way.
    pub fn inherit_collection_default_policies(
        &self,
        ctx: &Context,
        item: DsoRef,
        collection: DsoRef,
    ) -> Result<()> {
        let item_groups = self.authorized_groups(ctx, collection, Action::DefaultItemRead)?;
        if item_groups.is_empty() {
            return Err(AuthorizeError::invariant(format!(
                "{collection} has no default item READ policies"
            )));
        }
        let bitstream_groups =
            self.authorized_groups(ctx, collection, Action::DefaultBitstreamRead)?;
        if bitstream_groups.is_empty() {
            return Err(AuthorizeError::invariant(format!(
                "{collection} has no default bitstream READ policies"
            )));
        }

        self.replace_inherited(item, &item_groups)?;
        for bundle in self.graph.bundles_of(item) {
            self.replace_inherited(bundle, &bitstream_groups)?;
            for bitstream in self.graph.bitstreams_of(bundle) {
                self.replace_inherited(bitstream, &bitstream_groups)?;
            }
        }
        info!(%item, %collection, user = ?ctx.current_user(), "inherited collection default policies");
        Ok(())
    }

    fn replace_inherited(&self, object: DsoRef, groups: &[GroupId]) -> Result<()> {
        let additions = groups
            .iter()
            .map(|g| NewPolicy::new(object, Action::Read, *g).policy_type(PolicyType::Inherited))
            .collect();
        self.store
            .replace(object, &|p| p.policy_type() == PolicyType::Custom, additions)?;
        Ok(())
    }

    /// Grants the submitter, and each workflow group, READ/WRITE/ADD/REMOVE on
    /// a freshly submitted item.
    pub fn initialize_submission_policies(
        &self,
        ctx: &Context,
        item: DsoRef,
        submitter: EPersonId,
        workflow_groups: &[GroupId],
    ) -> Result<Vec<ResourcePolicy>> {
        let mut additions = Vec::new();
        for action in SUBMISSION_ACTIONS {
            additions.push(NewPolicy::new(item, action, submitter).policy_type(PolicyType::Submission));
            for group in workflow_groups {
                additions.push(NewPolicy::new(item, action, *group).policy_type(PolicyType::Workflow));
            }
        }
        let inserted = self.store.replace(item, &|_| true, additions)?;
        info!(%item, %submitter, policies = inserted.len(), user = ?ctx.current_user(), "submission policies initialized");
        Ok(inserted)
    }

    /// Drops every policy on a deleted object.
    pub fn remove_resource_policies(&self, ctx: &Context, object: DsoRef) -> Result<usize> {
        let removed = self.store.delete_by_resource(object)?;
        debug!(%object, removed, user = ?ctx.current_user(), "object policies removed");
        Ok(removed)
    }

    /// Drops every policy naming a deleted e-person.
    pub fn remove_actor_policies(&self, ctx: &Context, actor: EPersonId) -> Result<usize> {
        let removed = self.store.delete_by_actor(actor)?;
        debug!(%actor, removed, user = ?ctx.current_user(), "e-person policies removed");
        Ok(removed)
    }

    /// Drops every policy naming a deleted group.
    pub fn remove_group_policies(&self, ctx: &Context, group: GroupId) -> Result<usize> {
        let removed = self.store.delete_by_group(group)?;
        debug!(%group, removed, user = ?ctx.current_user(), "group policies removed");
        Ok(removed)
    }
}
