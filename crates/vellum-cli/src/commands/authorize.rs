//! Single cascade decisions.

use std::path::Path;

use anyhow::{Context as _, Result};
use vellum_authz::{CascadeResolver, Grant, Operation, PolicyEvaluator};
use vellum_config::VellumConfig;
use vellum_policy::PolicyStore;
use vellum_types::{DsoRef, PolicyId};

use super::context;
use crate::ActorArgs;
use crate::snapshot::Repository;

/// Decide `operation` on `target` and print how it was granted.
/// A denial is reported as an error.
pub fn run(
    config: &VellumConfig,
    snapshot: &Path,
    operation: &str,
    target: Option<&str>,
    actor: &ActorArgs,
) -> Result<()> {
    let operation: Operation = operation.parse()?;
    let repo = Repository::open(snapshot)?;
    let evaluator = PolicyEvaluator::new(&repo.store, &repo.graph, &repo.groups);
    let resolver = CascadeResolver::new(&evaluator, &repo.graph, &config.authorization);
    let ctx = context(actor);

    let object = || -> Result<DsoRef> {
        let target = target.with_context(|| format!("{operation} needs a target such as item:3"))?;
        Ok(target.parse()?)
    };

    let grant: Grant = match operation {
        Operation::ManageBitstreamPolicy => resolver.manage_bitstream_policy(&ctx, object()?)?,
        Operation::ManageBundlePolicy => resolver.manage_bundle_policy(&ctx, object()?)?,
        Operation::ManageItemPolicy => resolver.manage_item_policy(&ctx, object()?)?,
        Operation::ManageCollectionPolicy => resolver.manage_collection_policy(&ctx, object()?)?,
        Operation::ManageCommunityPolicy => resolver.manage_community_policy(&ctx, object()?)?,
        Operation::ManageCcLicense => resolver.manage_cc_license(&ctx, object()?)?,
        Operation::ManageTemplateItem => resolver.manage_template_item(&ctx, object()?)?,
        Operation::ManageSubmittersGroup => resolver.manage_submitters_group(&ctx, object()?)?,
        Operation::ManageWorkflowsGroup => resolver.manage_workflows_group(&ctx, object()?)?,
        Operation::ManageCollectionAdminGroup => {
            resolver.manage_collection_admin_group(&ctx, object()?)?
        }
        Operation::RemoveCollectionAdminGroup => {
            resolver.remove_collection_admin_group(&ctx, object()?)?
        }
        Operation::ManageCommunityAdminGroup => {
            resolver.manage_community_admin_group(&ctx, object()?)?
        }
        Operation::RemoveCommunityAdminGroup => {
            resolver.remove_community_admin_group(&ctx, object()?)?
        }
        Operation::WithdrawItem => resolver.withdraw_item(&ctx, object()?)?,
        Operation::ReinstateItem => resolver.reinstate_item(&ctx, object()?)?,
        Operation::ManagePolicy => {
            let id: u64 = target
                .context("manage-policy needs a policy ID")?
                .parse()
                .context("Policy ID must be a number")?;
            let policy = repo
                .store
                .get(PolicyId::new(id))?
                .with_context(|| format!("No policy {id} in snapshot"))?;
            resolver.manage_policy(&ctx, &policy)?
        }
        Operation::RequireAdminRole => resolver.require_admin_role(&ctx)?,
    };

    println!("granted: {} via {:?}", grant.operation, grant.path);
    Ok(())
}
