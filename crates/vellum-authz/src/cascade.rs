//! Delegated administration.
//!
//! Each administrative operation names a ladder of delegation rungs, each
//! gated by one configuration toggle: item admin, then owning-collection
//! admin, then community admin. The first enabled toggle picks the single
//! ADMIN check that decides the operation. With no toggle enabled only a
//! system administrator may proceed.
//!
//! A handful of operations deviate from the ladder:
//! - CC license management first tries plain ADD+REMOVE on the item.
//! - Collection group and template management first asks whether the user
//!   can edit the collection.
//! - Removing an admin group is decided one level up, by the parent's admin.
//! - Withdraw falls back to REMOVE on the owning collection.
//! - Reinstate must pass for every collection holding the item.

use tracing::{debug, warn};
use vellum_config::{AuthorizationConfig, Toggle};
use vellum_policy::ResourcePolicy;
use vellum_types::{Action, DsoRef, ResourceType};

use crate::context::Context;
use crate::error::{AuthorizeError, Result};
use crate::evaluator::Authorizer;
use crate::hierarchy::Containment;
use crate::operation::Operation;

/// Toggle lookups.
pub trait Toggles: Send + Sync {
    fn is_enabled(&self, toggle: Toggle) -> bool;
}

impl Toggles for AuthorizationConfig {
    fn is_enabled(&self, toggle: Toggle) -> bool {
        AuthorizationConfig::is_enabled(self, toggle)
    }
}

// ============================================================================
// Grant
// ============================================================================

/// How an operation was allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantPath {
    /// The request comes from a system administrator.
    SystemAdmin,
    /// ADMIN held on this object (directly or inherited).
    Admin(DsoRef),
    /// These actions held on this object.
    Direct { object: DsoRef, actions: Vec<Action> },
    /// The user can edit this collection.
    CanEdit(DsoRef),
    /// One path per collection (reinstate).
    Each(Vec<GrantPath>),
}

/// A successful authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub operation: Operation,
    pub path: GrantPath,
}

// ============================================================================
// Ladder rungs
// ============================================================================

/// Where a delegation rung points, relative to the subject of the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rung {
    /// The subject itself.
    This,
    /// The owning collection of an item.
    OwningCollection,
    /// The first community of an item's owning collection.
    OwningCommunity,
    /// The first parent community of a collection or community.
    ParentCommunity,
}

/// Checks tried in order by [`CascadeResolver::manage_cc_license`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CcLicenseCheck {
    AddAndRemove,
    DelegatedAdmin,
}

const CC_LICENSE_CHECKS: [CcLicenseCheck; 2] =
    [CcLicenseCheck::AddAndRemove, CcLicenseCheck::DelegatedAdmin];

const ITEM_POLICY_LADDER: [(Toggle, Rung); 3] = [
    (Toggle::ItemAdminManagePolicies, Rung::This),
    (Toggle::CollectionAdminManageItemPolicies, Rung::OwningCollection),
    (Toggle::CommunityAdminManageItemPolicies, Rung::OwningCommunity),
];

const COLLECTION_POLICY_LADDER: [(Toggle, Rung); 2] = [
    (Toggle::CollectionAdminManagePolicies, Rung::This),
    (Toggle::CommunityAdminManageCollectionPolicies, Rung::ParentCommunity),
];

const COMMUNITY_POLICY_LADDER: [(Toggle, Rung); 1] =
    [(Toggle::CommunityAdminManagePolicies, Rung::This)];

// The community toggle also resolves through the owning collection.
const CC_LICENSE_LADDER: [(Toggle, Rung); 3] = [
    (Toggle::ItemAdminManageCcLicense, Rung::This),
    (Toggle::CollectionAdminManageCcLicense, Rung::OwningCollection),
    (Toggle::CommunityAdminManageCcLicense, Rung::OwningCollection),
];

const TEMPLATE_ITEM_LADDER: [(Toggle, Rung); 2] = [
    (Toggle::CollectionAdminManageTemplateItem, Rung::This),
    (Toggle::CommunityAdminManageCollectionTemplateItem, Rung::ParentCommunity),
];

const SUBMITTERS_LADDER: [(Toggle, Rung); 2] = [
    (Toggle::CollectionAdminManageSubmitters, Rung::This),
    (Toggle::CommunityAdminManageCollectionSubmitters, Rung::ParentCommunity),
];

const WORKFLOWS_LADDER: [(Toggle, Rung); 2] = [
    (Toggle::CollectionAdminManageWorkflows, Rung::This),
    (Toggle::CommunityAdminManageCollectionWorkflows, Rung::ParentCommunity),
];

const COLLECTION_ADMIN_GROUP_LADDER: [(Toggle, Rung); 2] = [
    (Toggle::CollectionAdminManageAdminGroup, Rung::This),
    (Toggle::CommunityAdminManageCollectionAdminGroup, Rung::ParentCommunity),
];

const COMMUNITY_ADMIN_GROUP_LADDER: [(Toggle, Rung); 1] =
    [(Toggle::CommunityAdminManageAdminGroup, Rung::This)];

// ============================================================================
// CascadeResolver
// ============================================================================

/// Decides the delegated administrative operations.
///
/// Every entry point returns a [`Grant`] on success and
/// [`AuthorizeError::Denied`] naming the operation otherwise.
pub struct CascadeResolver<'a> {
    authorizer: &'a dyn Authorizer,
    graph: &'a dyn Containment,
    toggles: &'a dyn Toggles,
}

impl<'a> CascadeResolver<'a> {
    pub fn new(
        authorizer: &'a dyn Authorizer,
        graph: &'a dyn Containment,
        toggles: &'a dyn Toggles,
    ) -> Self {
        Self {
            authorizer,
            graph,
            toggles,
        }
    }

    // ------------------------------------------------------------------------
    // Policy management
    // ------------------------------------------------------------------------

    /// Decided on the bitstream's first bundle's first item.
    pub fn manage_bitstream_policy(&self, ctx: &Context, bitstream: DsoRef) -> Result<Grant> {
        self.bitstream_policy(ctx, Operation::ManageBitstreamPolicy, bitstream)
    }

    /// Decided on the bundle's first item.
    pub fn manage_bundle_policy(&self, ctx: &Context, bundle: DsoRef) -> Result<Grant> {
        self.bundle_policy(ctx, Operation::ManageBundlePolicy, bundle)
    }

    pub fn manage_item_policy(&self, ctx: &Context, item: DsoRef) -> Result<Grant> {
        self.ladder(ctx, Operation::ManageItemPolicy, item, &ITEM_POLICY_LADDER)
    }

    pub fn manage_collection_policy(&self, ctx: &Context, collection: DsoRef) -> Result<Grant> {
        self.ladder(
            ctx,
            Operation::ManageCollectionPolicy,
            collection,
            &COLLECTION_POLICY_LADDER,
        )
    }

    pub fn manage_community_policy(&self, ctx: &Context, community: DsoRef) -> Result<Grant> {
        self.ladder(
            ctx,
            Operation::ManageCommunityPolicy,
            community,
            &COMMUNITY_POLICY_LADDER,
        )
    }

    /// Dispatches on the policy's resource type. Types outside the content
    /// hierarchy require a system administrator.
    pub fn manage_policy(&self, ctx: &Context, policy: &ResourcePolicy) -> Result<Grant> {
        let op = Operation::ManagePolicy;
        let object = policy.resource();
        let in_hierarchy = matches!(
            object.resource_type,
            ResourceType::Bitstream
                | ResourceType::Bundle
                | ResourceType::Item
                | ResourceType::Collection
                | ResourceType::Community
        );
        if in_hierarchy && !self.graph.exists(object) {
            return Err(AuthorizeError::invariant(format!(
                "policy {} targets {object}, which does not exist",
                policy.id()
            )));
        }
        match object.resource_type {
            ResourceType::Bitstream => self.bitstream_policy(ctx, op, object),
            ResourceType::Bundle => self.bundle_policy(ctx, op, object),
            ResourceType::Item => self.ladder(ctx, op, object, &ITEM_POLICY_LADDER),
            ResourceType::Collection => self.ladder(ctx, op, object, &COLLECTION_POLICY_LADDER),
            ResourceType::Community => self.ladder(ctx, op, object, &COMMUNITY_POLICY_LADDER),
            _ => self.system_admin(ctx, op),
        }
    }

    pub fn require_admin_role(&self, ctx: &Context) -> Result<Grant> {
        self.system_admin(ctx, Operation::RequireAdminRole)
    }

    // ------------------------------------------------------------------------
    // Item operations
    // ------------------------------------------------------------------------

    /// Plain ADD+REMOVE on the item suffices; otherwise the CC-license ladder.
    pub fn manage_cc_license(&self, ctx: &Context, item: DsoRef) -> Result<Grant> {
        let op = Operation::ManageCcLicense;
        for check in CC_LICENSE_CHECKS {
            let grant = match check {
                CcLicenseCheck::AddAndRemove => self.add_and_remove(ctx, op, item)?,
                CcLicenseCheck::DelegatedAdmin => {
                    Some(self.ladder(ctx, op, item, &CC_LICENSE_LADDER)?)
                }
            };
            if let Some(grant) = grant {
                return Ok(grant);
            }
        }
        Err(self.deny(ctx, op))
    }

    /// Collection admin or community admin per toggle, falling back to
    /// REMOVE on the owning collection. Any single success suffices.
    pub fn withdraw_item(&self, ctx: &Context, item: DsoRef) -> Result<Grant> {
        let op = Operation::WithdrawItem;
        let owning = self.resolve(item, Rung::OwningCollection)?;

        let delegated = if self.toggles.is_enabled(Toggle::CollectionAdminWithdrawItem) {
            Some(owning)
        } else if self.toggles.is_enabled(Toggle::CommunityAdminWithdrawItem) {
            // A collection outside any community leaves only the REMOVE check.
            self.graph.first_parent_community(owning)
        } else {
            None
        };
        if let Some(target) = delegated {
            if self.authorizer.authorize_boolean(ctx, target, Action::Admin, true)? {
                return Ok(self.granted(ctx, op, GrantPath::Admin(target)));
            }
        }

        if self.authorizer.authorize_boolean(ctx, owning, Action::Remove, false)? {
            return Ok(self.granted(
                ctx,
                op,
                GrantPath::Direct {
                    object: owning,
                    actions: vec![Action::Remove],
                },
            ));
        }
        Err(self.deny(ctx, op))
    }

    /// Every collection holding the item must pass.
    pub fn reinstate_item(&self, ctx: &Context, item: DsoRef) -> Result<Grant> {
        let op = Operation::ReinstateItem;
        let collections = self.graph.collections_of(item);
        if collections.is_empty() {
            return Err(AuthorizeError::invariant(format!("{item} is in no collection")));
        }

        let mut paths = Vec::with_capacity(collections.len());
        for collection in collections {
            paths.push(self.reinstate_in(ctx, op, collection)?);
        }
        Ok(self.granted(ctx, op, GrantPath::Each(paths)))
    }

    fn reinstate_in(&self, ctx: &Context, op: Operation, collection: DsoRef) -> Result<GrantPath> {
        if self.toggles.is_enabled(Toggle::CollectionAdminReinstateItem) {
            return self.require(ctx, op, collection, Action::Add, true);
        }
        if self.toggles.is_enabled(Toggle::CommunityAdminReinstateItem) {
            if let Some(community) = self.graph.first_parent_community(collection) {
                if self.authorizer.authorize_boolean(ctx, community, Action::Admin, true)? {
                    return Ok(GrantPath::Admin(community));
                }
            }
        }
        self.require(ctx, op, collection, Action::Add, false)
    }

    // ------------------------------------------------------------------------
    // Collection and community groups
    // ------------------------------------------------------------------------

    pub fn manage_template_item(&self, ctx: &Context, collection: DsoRef) -> Result<Grant> {
        self.editable_or_ladder(
            ctx,
            Operation::ManageTemplateItem,
            collection,
            &TEMPLATE_ITEM_LADDER,
        )
    }

    pub fn manage_submitters_group(&self, ctx: &Context, collection: DsoRef) -> Result<Grant> {
        self.editable_or_ladder(
            ctx,
            Operation::ManageSubmittersGroup,
            collection,
            &SUBMITTERS_LADDER,
        )
    }

    pub fn manage_workflows_group(&self, ctx: &Context, collection: DsoRef) -> Result<Grant> {
        self.editable_or_ladder(
            ctx,
            Operation::ManageWorkflowsGroup,
            collection,
            &WORKFLOWS_LADDER,
        )
    }

    pub fn manage_collection_admin_group(
        &self,
        ctx: &Context,
        collection: DsoRef,
    ) -> Result<Grant> {
        self.editable_or_ladder(
            ctx,
            Operation::ManageCollectionAdminGroup,
            collection,
            &COLLECTION_ADMIN_GROUP_LADDER,
        )
    }

    /// Only an admin of the parent community may remove a collection's
    /// admin group; without one, only a system administrator.
    pub fn remove_collection_admin_group(
        &self,
        ctx: &Context,
        collection: DsoRef,
    ) -> Result<Grant> {
        self.remove_admin_group(
            ctx,
            Operation::RemoveCollectionAdminGroup,
            collection,
            Toggle::CommunityAdminManageCollectionAdminGroup,
        )
    }

    pub fn manage_community_admin_group(&self, ctx: &Context, community: DsoRef) -> Result<Grant> {
        self.ladder(
            ctx,
            Operation::ManageCommunityAdminGroup,
            community,
            &COMMUNITY_ADMIN_GROUP_LADDER,
        )
    }

    /// Only an admin of the parent community may remove a community's admin
    /// group; a top-level community needs a system administrator.
    pub fn remove_community_admin_group(
        &self,
        ctx: &Context,
        community: DsoRef,
    ) -> Result<Grant> {
        self.remove_admin_group(
            ctx,
            Operation::RemoveCommunityAdminGroup,
            community,
            Toggle::CommunityAdminManageAdminGroup,
        )
    }

    /// WRITE on the collection itself, or WRITE or ADD on a parent community.
    pub fn can_edit_collection(&self, ctx: &Context, collection: DsoRef) -> Result<bool> {
        if self.authorizer.authorize_boolean(ctx, collection, Action::Write, false)? {
            return Ok(true);
        }
        for community in self.graph.parent_communities(collection) {
            for action in [Action::Write, Action::Add] {
                if self.authorizer.authorize_boolean(ctx, community, action, false)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    // ------------------------------------------------------------------------
    // Building blocks
    // ------------------------------------------------------------------------

    fn bitstream_policy(&self, ctx: &Context, op: Operation, bitstream: DsoRef) -> Result<Grant> {
        let bundle = self
            .graph
            .bundles_of_bitstream(bitstream)
            .into_iter()
            .next()
            .ok_or_else(|| AuthorizeError::invariant(format!("{bitstream} is in no bundle")))?;
        self.bundle_policy(ctx, op, bundle)
    }

    fn bundle_policy(&self, ctx: &Context, op: Operation, bundle: DsoRef) -> Result<Grant> {
        let item = self
            .graph
            .items_of_bundle(bundle)
            .into_iter()
            .next()
            .ok_or_else(|| AuthorizeError::invariant(format!("{bundle} belongs to no item")))?;
        self.ladder(ctx, op, item, &ITEM_POLICY_LADDER)
    }

    /// The first enabled rung decides; no toggle means system admin only.
    fn ladder(
        &self,
        ctx: &Context,
        op: Operation,
        subject: DsoRef,
        ladder: &[(Toggle, Rung)],
    ) -> Result<Grant> {
        match ladder.iter().find(|(toggle, _)| self.toggles.is_enabled(*toggle)) {
            Some((_, rung)) => {
                let target = self.resolve(subject, *rung)?;
                let path = self.require(ctx, op, target, Action::Admin, true)?;
                Ok(self.granted(ctx, op, path))
            }
            None => self.system_admin(ctx, op),
        }
    }

    fn editable_or_ladder(
        &self,
        ctx: &Context,
        op: Operation,
        collection: DsoRef,
        ladder: &[(Toggle, Rung)],
    ) -> Result<Grant> {
        if self.can_edit_collection(ctx, collection)? {
            return Ok(self.granted(ctx, op, GrantPath::CanEdit(collection)));
        }
        self.ladder(ctx, op, collection, ladder)
    }

    fn remove_admin_group(
        &self,
        ctx: &Context,
        op: Operation,
        subject: DsoRef,
        toggle: Toggle,
    ) -> Result<Grant> {
        let parent = self.graph.first_parent_community(subject);
        match parent {
            Some(parent) if self.toggles.is_enabled(toggle) => {
                let path = self.require(ctx, op, parent, Action::Admin, true)?;
                Ok(self.granted(ctx, op, path))
            }
            _ => self.system_admin(ctx, op),
        }
    }

    /// `None` when either action is missing, leaving the decision to the next check.
    fn add_and_remove(&self, ctx: &Context, op: Operation, item: DsoRef) -> Result<Option<Grant>> {
        for action in [Action::Add, Action::Remove] {
            if !self.authorizer.authorize_boolean(ctx, item, action, true)? {
                return Ok(None);
            }
        }
        Ok(Some(self.granted(
            ctx,
            op,
            GrantPath::Direct {
                object: item,
                actions: vec![Action::Add, Action::Remove],
            },
        )))
    }

    fn resolve(&self, subject: DsoRef, rung: Rung) -> Result<DsoRef> {
        match rung {
            Rung::This => Ok(subject),
            Rung::OwningCollection => self.graph.owning_collection(subject).ok_or_else(|| {
                AuthorizeError::invariant(format!("{subject} has no owning collection"))
            }),
            Rung::OwningCommunity => {
                let collection = self.resolve(subject, Rung::OwningCollection)?;
                self.resolve(collection, Rung::ParentCommunity)
            }
            Rung::ParentCommunity => self.graph.first_parent_community(subject).ok_or_else(|| {
                AuthorizeError::invariant(format!("{subject} has no parent community"))
            }),
        }
    }

    fn require(
        &self,
        ctx: &Context,
        op: Operation,
        target: DsoRef,
        action: Action,
        use_inheritance: bool,
    ) -> Result<GrantPath> {
        if !self.authorizer.authorize_boolean(ctx, target, action, use_inheritance)? {
            return Err(self.deny(ctx, op));
        }
        Ok(if action == Action::Admin {
            GrantPath::Admin(target)
        } else {
            GrantPath::Direct {
                object: target,
                actions: vec![action],
            }
        })
    }

    fn system_admin(&self, ctx: &Context, op: Operation) -> Result<Grant> {
        if self.authorizer.is_admin(ctx)? {
            Ok(self.granted(ctx, op, GrantPath::SystemAdmin))
        } else {
            Err(self.deny(ctx, op))
        }
    }

    fn granted(&self, ctx: &Context, operation: Operation, path: GrantPath) -> Grant {
        debug!(%operation, user = ?ctx.current_user(), ?path, "operation granted");
        Grant { operation, path }
    }

    fn deny(&self, ctx: &Context, operation: Operation) -> AuthorizeError {
        warn!(%operation, user = ?ctx.current_user(), "operation denied");
        AuthorizeError::Denied {
            operation,
            actor: ctx.current_user(),
        }
    }
}
