//! The per-request authorization context.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use vellum_types::{EPersonId, GroupId};

/// Who is asking, and under which conditions.
///
/// A context without a current user is an anonymous request. Special groups
/// are memberships granted by the request itself (IP ranges, shibboleth
/// attributes) rather than by the group directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    current_user: Option<EPersonId>,
    special_groups: BTreeSet<GroupId>,
    ignore_authorization: bool,
    today: Option<NaiveDate>,
}

impl Context {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: EPersonId) -> Self {
        Self {
            current_user: Some(user),
            ..Self::default()
        }
    }

    pub fn with_special_group(mut self, group: GroupId) -> Self {
        self.special_groups.insert(group);
        self
    }

    /// Switches authorization off for trusted batch work.
    /// Every check passes and [`is_admin`](crate::Authorizer::is_admin) holds.
    pub fn ignoring_authorization(mut self) -> Self {
        self.ignore_authorization = true;
        self
    }

    /// Pins the evaluation date instead of reading the clock.
    pub fn on(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn current_user(&self) -> Option<EPersonId> {
        self.current_user
    }

    pub fn special_groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.special_groups.iter().copied()
    }

    pub fn ignores_authorization(&self) -> bool {
        self.ignore_authorization
    }

    /// The date policy windows are evaluated against (UTC).
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}
