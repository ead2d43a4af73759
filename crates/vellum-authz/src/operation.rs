//! Names of the delegated administrative operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthorizeError;

/// An administrative operation guarded by the cascade resolver.
///
/// Denials carry the operation so callers can report what was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    ManageBitstreamPolicy,
    ManageBundlePolicy,
    ManageItemPolicy,
    ManageCollectionPolicy,
    ManageCommunityPolicy,
    ManageCcLicense,
    ManageTemplateItem,
    ManageSubmittersGroup,
    ManageWorkflowsGroup,
    ManageCollectionAdminGroup,
    RemoveCollectionAdminGroup,
    ManageCommunityAdminGroup,
    RemoveCommunityAdminGroup,
    WithdrawItem,
    ReinstateItem,
    ManagePolicy,
    RequireAdminRole,
}

impl Operation {
    pub const ALL: [Operation; 17] = [
        Self::ManageBitstreamPolicy,
        Self::ManageBundlePolicy,
        Self::ManageItemPolicy,
        Self::ManageCollectionPolicy,
        Self::ManageCommunityPolicy,
        Self::ManageCcLicense,
        Self::ManageTemplateItem,
        Self::ManageSubmittersGroup,
        Self::ManageWorkflowsGroup,
        Self::ManageCollectionAdminGroup,
        Self::RemoveCollectionAdminGroup,
        Self::ManageCommunityAdminGroup,
        Self::RemoveCommunityAdminGroup,
        Self::WithdrawItem,
        Self::ReinstateItem,
        Self::ManagePolicy,
        Self::RequireAdminRole,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageBitstreamPolicy => "manage-bitstream-policy",
            Self::ManageBundlePolicy => "manage-bundle-policy",
            Self::ManageItemPolicy => "manage-item-policy",
            Self::ManageCollectionPolicy => "manage-collection-policy",
            Self::ManageCommunityPolicy => "manage-community-policy",
            Self::ManageCcLicense => "manage-cc-license",
            Self::ManageTemplateItem => "manage-template-item",
            Self::ManageSubmittersGroup => "manage-submitters-group",
            Self::ManageWorkflowsGroup => "manage-workflows-group",
            Self::ManageCollectionAdminGroup => "manage-collection-admin-group",
            Self::RemoveCollectionAdminGroup => "remove-collection-admin-group",
            Self::ManageCommunityAdminGroup => "manage-community-admin-group",
            Self::RemoveCommunityAdminGroup => "remove-community-admin-group",
            Self::WithdrawItem => "withdraw-item",
            Self::ReinstateItem => "reinstate-item",
            Self::ManagePolicy => "manage-policy",
            Self::RequireAdminRole => "require-admin-role",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = AuthorizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| AuthorizeError::InvariantViolation(format!("unknown operation: {s}")))
    }
}
