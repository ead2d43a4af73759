//! # vellum-types: Core types for `Vellum`
//!
//! This crate contains shared types used across the `Vellum` system:
//! - Entity IDs ([`ResourceId`], [`EPersonId`], [`GroupId`], [`PolicyId`])
//! - Repository object addressing ([`ResourceType`], [`DsoRef`])
//! - Policy vocabulary ([`Action`], [`PolicyType`], [`Principal`])
//!
//! Resource ids are only unique *within* a resource type, so every object
//! reference is the pair carried by [`DsoRef`].

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Entity IDs - All Copy (cheap 8-byte values)
// ============================================================================

/// Identifier of a repository object, unique within its [`ResourceType`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ResourceId(u64);

impl ResourceId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ResourceId> for u64 {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// Identifier of a single principal (an "e-person").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EPersonId(u64);

impl EPersonId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for EPersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EPersonId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<EPersonId> for u64 {
    fn from(id: EPersonId) -> Self {
        id.0
    }
}

/// Identifier of a named set of principals.
///
/// Two ids are reserved:
/// - [`GroupId::ANONYMOUS`] contains every request, authenticated or not.
/// - [`GroupId::ADMINISTRATOR`] holds the system administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(u64);

impl GroupId {
    pub const ANONYMOUS: GroupId = GroupId(0);
    pub const ADMINISTRATOR: GroupId = GroupId(1);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn is_anonymous(self) -> bool {
        self == Self::ANONYMOUS
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GroupId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<GroupId> for u64 {
    fn from(id: GroupId) -> Self {
        id.0
    }
}

/// Identifier of a stored resource policy. Assigned by the policy store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(u64);

impl PolicyId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the id that follows this one, or `None` past `u64::MAX`.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PolicyId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<PolicyId> for u64 {
    fn from(id: PolicyId) -> Self {
        id.0
    }
}

// ============================================================================
// Resource Types - Copy (stable numeric codes)
// ============================================================================

/// Kind of object a policy can target.
///
/// The numeric codes are stable and appear in persisted policy records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Bitstream = 0,
    Bundle = 1,
    Item = 2,
    Collection = 3,
    Community = 4,
    Site = 5,
    Group = 6,
    #[serde(rename = "eperson")]
    EPerson = 7,
}

impl ResourceType {
    /// Every resource type, in code order.
    pub const ALL: [ResourceType; 8] = [
        Self::Bitstream,
        Self::Bundle,
        Self::Item,
        Self::Collection,
        Self::Community,
        Self::Site,
        Self::Group,
        Self::EPerson,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Returns the lowercase name used in logs and CLI arguments.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bitstream => "bitstream",
            Self::Bundle => "bundle",
            Self::Item => "item",
            Self::Collection => "collection",
            Self::Community => "community",
            Self::Site => "site",
            Self::Group => "group",
            Self::EPerson => "eperson",
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseTypeError::new("resource type", s))
    }
}

/// Reference to a repository object: the `(type, id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DsoRef {
    pub resource_type: ResourceType,
    pub id: ResourceId,
}

impl DsoRef {
    pub fn new(resource_type: ResourceType, id: impl Into<ResourceId>) -> Self {
        Self {
            resource_type,
            id: id.into(),
        }
    }

    pub fn bitstream(id: u64) -> Self {
        Self::new(ResourceType::Bitstream, id)
    }

    pub fn bundle(id: u64) -> Self {
        Self::new(ResourceType::Bundle, id)
    }

    pub fn item(id: u64) -> Self {
        Self::new(ResourceType::Item, id)
    }

    pub fn collection(id: u64) -> Self {
        Self::new(ResourceType::Collection, id)
    }

    pub fn community(id: u64) -> Self {
        Self::new(ResourceType::Community, id)
    }

    pub fn is(&self, resource_type: ResourceType) -> bool {
        self.resource_type == resource_type
    }
}

impl Display for DsoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.id)
    }
}

impl FromStr for DsoRef {
    type Err = ParseTypeError;

    /// Parses the `type:id` form produced by [`Display`], e.g. `item:42`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| ParseTypeError::new("object reference", s))?;
        let resource_type = kind.parse()?;
        let id = id
            .parse::<u64>()
            .map_err(|_| ParseTypeError::new("object reference", s))?;
        Ok(Self::new(resource_type, id))
    }
}

// ============================================================================
// Actions - Copy (stable numeric codes)
// ============================================================================

/// Operation a policy permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Read = 0,
    Write = 1,
    Delete = 2,
    Add = 3,
    Remove = 4,
    WorkflowStep1 = 5,
    WorkflowStep2 = 6,
    WorkflowStep3 = 7,
    WorkflowAbort = 8,
    /// Granted on a collection: who may read bitstreams of items submitted to it.
    DefaultBitstreamRead = 9,
    /// Granted on a collection: who may read items submitted to it.
    DefaultItemRead = 10,
    Admin = 11,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Self::Read,
        Self::Write,
        Self::Delete,
        Self::Add,
        Self::Remove,
        Self::WorkflowStep1,
        Self::WorkflowStep2,
        Self::WorkflowStep3,
        Self::WorkflowAbort,
        Self::DefaultBitstreamRead,
        Self::DefaultItemRead,
        Self::Admin,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Delete => "DELETE",
            Self::Add => "ADD",
            Self::Remove => "REMOVE",
            Self::WorkflowStep1 => "WORKFLOW_STEP_1",
            Self::WorkflowStep2 => "WORKFLOW_STEP_2",
            Self::WorkflowStep3 => "WORKFLOW_STEP_3",
            Self::WorkflowAbort => "WORKFLOW_ABORT",
            Self::DefaultBitstreamRead => "DEFAULT_BITSTREAM_READ",
            Self::DefaultItemRead => "DEFAULT_ITEM_READ",
            Self::Admin => "ADMIN",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseTypeError::new("action", s))
    }
}

// ============================================================================
// Policy Provenance - Copy
// ============================================================================

/// Provenance tag of a policy.
///
/// Bulk replacement is scoped by this tag: replacing "everything except
/// `Custom`" refreshes inherited defaults without touching hand-made grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyType {
    Submission,
    Workflow,
    Custom,
    Inherited,
}

impl PolicyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submission => "TYPE_SUBMISSION",
            Self::Workflow => "TYPE_WORKFLOW",
            Self::Custom => "TYPE_CUSTOM",
            Self::Inherited => "TYPE_INHERITED",
        }
    }
}

impl Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Principal - Copy (exactly one of actor or group)
// ============================================================================

/// Who a policy grants to: a single e-person or a group, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    Actor(EPersonId),
    Group(GroupId),
}

impl Principal {
    pub fn actor(self) -> Option<EPersonId> {
        match self {
            Self::Actor(id) => Some(id),
            Self::Group(_) => None,
        }
    }

    pub fn group(self) -> Option<GroupId> {
        match self {
            Self::Group(id) => Some(id),
            Self::Actor(_) => None,
        }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor(id) => write!(f, "eperson {id}"),
            Self::Group(id) => write!(f, "group {id}"),
        }
    }
}

impl From<EPersonId> for Principal {
    fn from(id: EPersonId) -> Self {
        Self::Actor(id)
    }
}

impl From<GroupId> for Principal {
    fn from(id: GroupId) -> Self {
        Self::Group(id)
    }
}

// ============================================================================
// Parse errors
// ============================================================================

/// Error returned when a textual type name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTypeError {
    kind: &'static str,
    input: String,
}

impl ParseTypeError {
    fn new(kind: &'static str, input: &str) -> Self {
        Self {
            kind,
            input: input.to_string(),
        }
    }
}

impl Display for ParseTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.input)
    }
}

impl std::error::Error for ParseTypeError {}
