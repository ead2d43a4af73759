//! The policy evaluation primitive.
//!
//! Every higher-level decision reduces to [`Authorizer::authorize_boolean`]:
//! is there an active policy for `(object, action)` naming the current user or
//! one of the groups the request belongs to?

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;
use vellum_policy::PolicyStore;
use vellum_types::{Action, DsoRef, GroupId, Principal};

use crate::context::Context;
use crate::error::{AuthorizeError, Result};
use crate::groups::GroupDirectory;
use crate::hierarchy::Containment;

/// Yes/no access decisions.
///
/// This is the seam the cascade resolver and the embargo setter call through,
/// so tests can substitute a recording implementation.
pub trait Authorizer: Send + Sync {
    /// Whether the request comes from a system administrator.
    fn is_admin(&self, ctx: &Context) -> Result<bool>;

    /// Whether `action` on `object` is granted. With `use_inheritance`,
    /// ADMIN on the object or any ancestor also grants it.
    fn authorize_boolean(
        &self,
        ctx: &Context,
        object: DsoRef,
        action: Action,
        use_inheritance: bool,
    ) -> Result<bool>;

    /// Like [`authorize_boolean`](Self::authorize_boolean), failing with
    /// [`AuthorizeError::ActionDenied`] instead of returning false.
    fn authorize_action(
        &self,
        ctx: &Context,
        object: DsoRef,
        action: Action,
        use_inheritance: bool,
    ) -> Result<()> {
        if self.authorize_boolean(ctx, object, action, use_inheritance)? {
            Ok(())
        } else {
            Err(AuthorizeError::ActionDenied {
                action,
                object,
                actor: ctx.current_user(),
            })
        }
    }

    fn authorize(&self, ctx: &Context, object: DsoRef, action: Action) -> Result<()> {
        self.authorize_action(ctx, object, action, true)
    }
}

/// [`Authorizer`] over a policy store, a containment graph and a group directory.
pub struct PolicyEvaluator<'a> {
    store: &'a dyn PolicyStore,
    graph: &'a dyn Containment,
    groups: &'a dyn GroupDirectory,
}

impl<'a> PolicyEvaluator<'a> {
    pub fn new(
        store: &'a dyn PolicyStore,
        graph: &'a dyn Containment,
        groups: &'a dyn GroupDirectory,
    ) -> Self {
        Self {
            store,
            graph,
            groups,
        }
    }

    /// Every group the request counts as a member of.
    ///
    /// Always contains Anonymous. Special groups from the context count
    /// like directory memberships, nesting included.
    pub fn memberships(&self, ctx: &Context) -> BTreeSet<GroupId> {
        let mut seeds = BTreeSet::from([GroupId::ANONYMOUS]);
        seeds.extend(ctx.special_groups());
        if let Some(user) = ctx.current_user() {
            seeds.extend(self.groups.direct_groups(user));
        }
        self.groups.closure(seeds)
    }

    /// Whether an active `action` policy on `object` names the request.
    fn has_policy(
        &self,
        ctx: &Context,
        memberships: &BTreeSet<GroupId>,
        object: DsoRef,
        action: Action,
    ) -> Result<bool> {
        let today = ctx.today();
        let policies = self.store.find_by_resource_and_action(object, action)?;
        Ok(policies.iter().any(|p| {
            p.is_active_on(today)
                && match p.principal() {
                    Principal::Actor(actor) => ctx.current_user() == Some(actor),
                    Principal::Group(group) => memberships.contains(&group),
                }
        }))
    }

    /// ADMIN on `object` or anything above it.
    fn holds_admin(
        &self,
        ctx: &Context,
        memberships: &BTreeSet<GroupId>,
        object: DsoRef,
    ) -> Result<bool> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([object]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if self.has_policy(ctx, memberships, current, Action::Admin)? {
                return Ok(true);
            }
            queue.extend(self.graph.parents(current));
        }
        Ok(false)
    }
}

impl Authorizer for PolicyEvaluator<'_> {
    fn is_admin(&self, ctx: &Context) -> Result<bool> {
        if ctx.ignores_authorization() {
            return Ok(true);
        }
        Ok(self.memberships(ctx).contains(&GroupId::ADMINISTRATOR))
    }

    fn authorize_boolean(
        &self,
        ctx: &Context,
        object: DsoRef,
        action: Action,
        use_inheritance: bool,
    ) -> Result<bool> {
        if self.is_admin(ctx)? {
            debug!(%object, %action, "granted to system administrator");
            return Ok(true);
        }
        let memberships = self.memberships(ctx);
        if use_inheritance && self.holds_admin(ctx, &memberships, object)? {
            debug!(%object, %action, user = ?ctx.current_user(), "granted through ADMIN");
            return Ok(true);
        }
        let granted = self.has_policy(ctx, &memberships, object, action)?;
        if granted {
            debug!(%object, %action, user = ?ctx.current_user(), "granted by policy");
        }
        Ok(granted)
    }
}
