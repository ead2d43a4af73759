//! Embargo compliance check.
//!
//! Read-only: reports open-ended READ grants that would let anyone through
//! an embargo, and changes nothing.

use std::fmt::{self, Display};

use serde::Serialize;
use tracing::{debug, warn};
use vellum_authz::Context;
use vellum_types::{Action, DsoRef, PolicyId, Principal, ResourceType};

use crate::error::Result;
use crate::service::EmbargoService;

/// An unbounded READ grant found under an embargoed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The bundle or bitstream carrying the grant.
    pub object: DsoRef,
    /// Name of the bundle the object belongs to (the object itself for bundles).
    pub bundle: String,
    pub principal: Principal,
    pub policy: PolicyId,
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.object.is(ResourceType::Bundle) {
            write!(
                f,
                "bundle {} ({}) allows READ by {}",
                self.bundle, self.object, self.principal
            )
        } else {
            write!(
                f,
                "{} (in bundle {}) allows READ by {}",
                self.object, self.bundle, self.principal
            )
        }
    }
}

impl EmbargoService<'_> {
    /// Lists every unbounded READ grant on the item's embargoed bundles and
    /// their bitstreams.
    ///
    /// Bundles named in `unreported_bundles` may stay readable themselves;
    /// their bitstreams are still checked.
    pub fn check_embargo(&self, ctx: &Context, item: DsoRef) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        for entry in self.embargoed_bundles(item) {
            if !self.config.is_unreported(&entry.name) {
                self.collect(entry.bundle, &entry.name, &mut violations)?;
            }
            for bitstream in &entry.bitstreams {
                self.collect(*bitstream, &entry.name, &mut violations)?;
            }
        }

        for violation in &violations {
            warn!(%item, object = %violation.object, principal = %violation.principal, policy_id = %violation.policy, "embargo check: {violation}");
        }
        debug!(%item, violations = violations.len(), user = ?ctx.current_user(), "embargo checked");
        Ok(violations)
    }

    fn collect(&self, object: DsoRef, bundle: &str, out: &mut Vec<Violation>) -> Result<()> {
        let open = self
            .store
            .find_by_resource_and_action(object, Action::Read)?
            .into_iter()
            .filter(|p| p.is_unbounded())
            .map(|p| Violation {
                object,
                bundle: bundle.to_string(),
                principal: p.principal(),
                policy: p.id(),
            });
        out.extend(open);
        Ok(())
    }
}
