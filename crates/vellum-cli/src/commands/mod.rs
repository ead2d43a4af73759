//! CLI command implementations.

pub mod authorize;
pub mod config;
pub mod embargo;

use vellum_authz::Context;
use vellum_types::{EPersonId, GroupId};

use crate::ActorArgs;

/// The request context the command runs under.
fn context(actor: &ActorArgs) -> Context {
    let mut ctx = actor
        .user
        .map_or_else(Context::anonymous, |user| Context::for_user(EPersonId::new(user)));
    for group in &actor.special_groups {
        ctx = ctx.with_special_group(GroupId::new(*group));
    }
    if actor.admin {
        ctx = ctx.ignoring_authorization();
    }
    ctx
}
