//! Resource policy records.
//!
//! A [`ResourcePolicy`] is an immutable value. Changing one produces a new
//! value through the `with_*` builders, which is then persisted with
//! [`PolicyStore::update`](crate::PolicyStore::update). New records start life
//! as a [`NewPolicy`] draft; the store assigns the id.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use vellum_types::{Action, DsoRef, PolicyId, PolicyType, Principal};

use crate::error::{Result, StoreError};

// ============================================================================
// NewPolicy
// ============================================================================

/// A policy that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPolicy {
    pub resource: DsoRef,
    pub action: Action,
    pub principal: Principal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub policy_type: PolicyType,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl NewPolicy {
    /// An open-ended `Custom` grant.
    pub fn new(resource: DsoRef, action: Action, principal: impl Into<Principal>) -> Self {
        Self {
            resource,
            action,
            principal: principal.into(),
            start_date: None,
            end_date: None,
            policy_type: PolicyType::Custom,
            name: None,
            description: None,
        }
    }

    pub fn policy_type(mut self, policy_type: PolicyType) -> Self {
        self.policy_type = policy_type;
        self
    }

    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn ending(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches the store-assigned id.
    pub(crate) fn into_policy(self, id: PolicyId) -> ResourcePolicy {
        ResourcePolicy {
            id,
            resource: self.resource,
            action: self.action,
            principal: self.principal,
            start_date: self.start_date,
            end_date: self.end_date,
            policy_type: self.policy_type,
            name: self.name,
            description: self.description,
        }
    }
}

// ============================================================================
// ResourcePolicy
// ============================================================================

/// A stored grant of one action on one object to one principal.
///
/// The policy is active on day `d` iff `start_date <= d <= end_date`, where a
/// missing bound is open. The end date is how embargoes are expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePolicy {
    id: PolicyId,
    resource: DsoRef,
    action: Action,
    principal: Principal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    policy_type: PolicyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ResourcePolicy {
    pub fn id(&self) -> PolicyId {
        self.id
    }

    pub fn resource(&self) -> DsoRef {
        self.resource
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn policy_type(&self) -> PolicyType {
        self.policy_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether `today` falls inside the validity window.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| start <= today)
            && self.end_date.is_none_or(|end| today <= end)
    }

    /// A grant without an end date never expires.
    pub fn is_unbounded(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_start_date(mut self, start_date: Option<NaiveDate>) -> Self {
        self.start_date = start_date;
        self
    }

    pub fn with_end_date(mut self, end_date: Option<NaiveDate>) -> Self {
        self.end_date = end_date;
        self
    }

    pub fn with_policy_type(mut self, policy_type: PolicyType) -> Self {
        self.policy_type = policy_type;
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// Rejects windows that end before they start.
pub(crate) fn check_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(StoreError::InvalidWindow { start, end }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use vellum_types::GroupId;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stored(draft: NewPolicy) -> ResourcePolicy {
        draft.into_policy(PolicyId::new(1))
    }

    #[test_case(None, None, day(2020, 1, 1) => true ; "open both ends")]
    #[test_case(Some(day(2024, 1, 1)), None, day(2023, 12, 31) => false ; "before start")]
    #[test_case(Some(day(2024, 1, 1)), None, day(2024, 1, 1) => true ; "on start day")]
    #[test_case(None, Some(day(2024, 6, 30)), day(2024, 6, 30) => true ; "on end day")]
    #[test_case(None, Some(day(2024, 6, 30)), day(2024, 7, 1) => false ; "after end")]
    #[test_case(Some(day(2024, 1, 1)), Some(day(2024, 12, 31)), day(2024, 6, 1) => true ; "inside window")]
    fn test_is_active_on(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> bool {
        let mut draft = NewPolicy::new(DsoRef::item(1), Action::Read, GroupId::ANONYMOUS);
        draft.start_date = start;
        draft.end_date = end;
        stored(draft).is_active_on(today)
    }

    #[test]
    fn test_builders_leave_identity_alone() {
        let policy = stored(NewPolicy::new(DsoRef::bundle(3), Action::Read, GroupId::new(9)));
        let changed = policy
            .clone()
            .with_end_date(Some(day(2030, 1, 1)))
            .with_policy_type(PolicyType::Inherited)
            .with_description(Some("embargo".to_string()));

        assert_eq!(changed.id(), policy.id());
        assert_eq!(changed.resource(), policy.resource());
        assert_eq!(changed.principal(), policy.principal());
        assert!(!changed.is_unbounded());
        assert_eq!(changed.description(), Some("embargo"));
        assert!(policy.is_unbounded());
    }

    #[test]
    fn test_empty_window_is_rejected() {
        assert!(check_window(Some(day(2024, 2, 1)), Some(day(2024, 1, 1))).is_err());
        assert!(check_window(Some(day(2024, 1, 1)), Some(day(2024, 1, 1))).is_ok());
        assert!(check_window(None, Some(day(2024, 1, 1))).is_ok());
    }

    #[test]
    fn test_serialized_form_omits_open_bounds() {
        let policy = stored(
            NewPolicy::new(DsoRef::bitstream(4), Action::Read, GroupId::ANONYMOUS)
                .ending(day(2030, 1, 1)),
        );
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["end_date"], "2030-01-01");
        assert!(json.get("start_date").is_none());
        assert_eq!(json["principal"]["group"], 0);

        let back: ResourcePolicy = serde_json::from_value(json).unwrap();
        assert_eq!(back, policy);
    }
}
