//! Setting an embargo.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};
use vellum_authz::Context;
use vellum_policy::ResourcePolicy;
use vellum_types::{Action, DsoRef, GroupId, Principal};

use crate::error::Result;
use crate::service::EmbargoService;
use crate::terms::LiftDate;

/// What [`EmbargoService::set_embargo`] wrote.
#[derive(Debug, Clone, Serialize)]
pub struct EmbargoOutcome {
    pub item: DsoRef,
    /// `None` when the terms were blank and nothing was written.
    pub lift: Option<LiftDate>,
    /// Every READ policy created or refreshed, in write order.
    pub policies: Vec<ResourcePolicy>,
}

impl EmbargoService<'_> {
    /// Parses `terms` and embargoes `item` until the lift date.
    ///
    /// The caller must be allowed to manage the item's policies; the check
    /// runs before anything is written. Blank terms write nothing.
    pub fn set_embargo(
        &self,
        ctx: &Context,
        item: DsoRef,
        terms: Option<&str>,
    ) -> Result<EmbargoOutcome> {
        self.resolver.manage_item_policy(ctx, item)?;
        let Some(lift) = self.parse_terms(terms)? else {
            debug!(%item, "no embargo terms");
            return Ok(EmbargoOutcome {
                item,
                lift: None,
                policies: Vec::new(),
            });
        };
        self.write_embargo(ctx, item, lift)
    }

    /// Embargoes `item` until `lift`, skipping term parsing.
    pub fn set_embargo_until(
        &self,
        ctx: &Context,
        item: DsoRef,
        lift: LiftDate,
    ) -> Result<EmbargoOutcome> {
        self.resolver.manage_item_policy(ctx, item)?;
        self.write_embargo(ctx, item, lift)
    }

    /// Writes a READ policy ending on the lift date, for each embargo
    /// principal, on every non-excluded bundle and its bitstreams.
    ///
    /// Every write is planned first and then applied in one batch, so a
    /// failure leaves the item as it was.
    fn write_embargo(&self, ctx: &Context, item: DsoRef, lift: LiftDate) -> Result<EmbargoOutcome> {
        let collection = self.owning_collection(item)?;
        let principals = self.embargo_principals(ctx, collection)?;
        if principals.is_empty() {
            warn!(%item, %collection, "owning collection grants no default item READ; nothing to embargo");
        }

        let end_date = Some(lift.end_date());
        let mut seen = BTreeSet::new();
        let mut writes = Vec::new();
        for entry in self.embargoed_bundles(item) {
            let objects = std::iter::once(entry.bundle).chain(entry.bitstreams);
            // Bitstreams shared between bundles are written once.
            for object in objects.filter(|o| seen.insert(*o)) {
                for principal in &principals {
                    writes.push(self.policies.plan_policy(
                        None,
                        *principal,
                        None,
                        end_date,
                        Action::Read,
                        None,
                        object,
                    )?);
                }
            }
        }
        let policies = self.store.write_batch(writes)?;

        info!(
            %item,
            %lift,
            objects = seen.len(),
            policies = policies.len(),
            user = ?ctx.current_user(),
            "embargo set"
        );
        Ok(EmbargoOutcome {
            item,
            lift: Some(lift),
            policies,
        })
    }

    /// Anonymous alone when the collection is world-readable, otherwise
    /// every group with default item READ.
    fn embargo_principals(&self, ctx: &Context, collection: DsoRef) -> Result<Vec<Principal>> {
        let groups = self
            .policies
            .authorized_groups(ctx, collection, Action::DefaultItemRead)?;
        if groups.contains(&GroupId::ANONYMOUS) {
            return Ok(vec![Principal::Group(GroupId::ANONYMOUS)]);
        }
        Ok(groups.into_iter().map(Principal::Group).collect())
    }
}
