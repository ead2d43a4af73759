//! Lifting an embargo.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;
use vellum_authz::Context;
use vellum_policy::{NewPolicy, ResourcePolicy};
use vellum_types::{Action, DsoRef, GroupId, PolicyType, Principal};

use crate::error::{EmbargoError, Result};
use crate::service::EmbargoService;

/// What [`EmbargoService::lift_embargo`] restored.
#[derive(Debug, Clone, Serialize)]
pub struct LiftOutcome {
    pub item: DsoRef,
    /// The `Inherited` READ grants now in place.
    pub policies: Vec<ResourcePolicy>,
}

impl EmbargoService<'_> {
    /// Ends the embargo on `item` now.
    ///
    /// On every embargoed bundle and bitstream, time-bounded READ grants are
    /// dropped and the owning collection's default bitstream READ groups are
    /// granted READ again without an end date. Other grants stay. Each
    /// object is rewritten in one store operation.
    pub fn lift_embargo(&self, ctx: &Context, item: DsoRef) -> Result<LiftOutcome> {
        self.resolver.manage_item_policy(ctx, item)?;
        let collection = self.owning_collection(item)?;
        let groups: BTreeSet<GroupId> = self
            .policies
            .authorized_groups(ctx, collection, Action::DefaultBitstreamRead)?
            .into_iter()
            .collect();
        if groups.is_empty() {
            return Err(EmbargoError::invariant(format!(
                "{collection} has no default bitstream READ policies to restore"
            )));
        }

        // An unbounded READ for a restored group is superseded by the new grant.
        let keep = |p: &ResourcePolicy| {
            p.action() != Action::Read
                || (p.is_unbounded()
                    && !matches!(p.principal(), Principal::Group(g) if groups.contains(&g)))
        };

        let mut seen = BTreeSet::new();
        let mut policies = Vec::new();
        for entry in self.embargoed_bundles(item) {
            let objects = std::iter::once(entry.bundle).chain(entry.bitstreams);
            for object in objects.filter(|o| seen.insert(*o)) {
                let additions = groups
                    .iter()
                    .map(|g| {
                        NewPolicy::new(object, Action::Read, *g).policy_type(PolicyType::Inherited)
                    })
                    .collect();
                policies.extend(self.store.replace(object, &keep, additions)?);
            }
        }

        info!(
            %item,
            %collection,
            objects = seen.len(),
            policies = policies.len(),
            user = ?ctx.current_user(),
            "embargo lifted"
        );
        Ok(LiftOutcome { item, policies })
    }
}
