//! Configuration management for Vellum
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (VELLUM_* prefix, `__` between sections)
//! 2. vellum.local.toml (gitignored, local overrides)
//! 3. vellum.toml (git-tracked, repository config)
//! 4. ~/.config/vellum/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! The `[authorization]` section holds the delegation toggles consulted by the
//! cascade resolver; `[embargo]` holds the embargo vocabulary.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{ConfigLayer, Paths};

/// Main Vellum configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VellumConfig {
    pub authorization: AuthorizationConfig,
    pub embargo: EmbargoConfig,
}

impl VellumConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from a specific repository directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.embargo.terms_open.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "embargo.terms_open must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Read a single TOML file without layering (used for `--config` overrides).
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> std::result::Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ============================================================================
// Delegation toggles
// ============================================================================

/// Which item-level operations an item admin may perform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ItemAdminConfig {
    pub policies: bool,
    pub cc_license: bool,
}

impl Default for ItemAdminConfig {
    fn default() -> Self {
        Self {
            policies: true,
            cc_license: true,
        }
    }
}

/// Which operations a collection admin may perform on the collection and its items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CollectionAdminConfig {
    pub policies: bool,
    pub template_item: bool,
    pub submitters: bool,
    pub workflows: bool,
    pub admin_group: bool,
    pub item_policies: bool,
    pub item_withdraw: bool,
    pub item_reinstate: bool,
    pub cc_license: bool,
}

impl Default for CollectionAdminConfig {
    fn default() -> Self {
        Self {
            policies: true,
            template_item: true,
            submitters: true,
            workflows: true,
            admin_group: true,
            item_policies: true,
            item_withdraw: true,
            item_reinstate: true,
            cc_license: true,
        }
    }
}

/// Which operations a community admin may perform on everything beneath it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommunityAdminConfig {
    pub policies: bool,
    pub admin_group: bool,
    pub collection_policies: bool,
    pub collection_template_item: bool,
    pub collection_submitters: bool,
    pub collection_workflows: bool,
    pub collection_admin_group: bool,
    pub item_policies: bool,
    pub item_withdraw: bool,
    pub item_reinstate: bool,
    pub cc_license: bool,
}

impl Default for CommunityAdminConfig {
    fn default() -> Self {
        Self {
            policies: true,
            admin_group: true,
            collection_policies: true,
            collection_template_item: true,
            collection_submitters: true,
            collection_workflows: true,
            collection_admin_group: true,
            item_policies: true,
            item_withdraw: true,
            item_reinstate: true,
            cc_license: true,
        }
    }
}

/// Delegation toggles. Every toggle defaults to enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthorizationConfig {
    pub item_admin: ItemAdminConfig,
    pub collection_admin: CollectionAdminConfig,
    pub community_admin: CommunityAdminConfig,
}

/// Name of a single delegation toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Toggle {
    ItemAdminManagePolicies,
    ItemAdminManageCcLicense,
    CollectionAdminManagePolicies,
    CollectionAdminManageTemplateItem,
    CollectionAdminManageSubmitters,
    CollectionAdminManageWorkflows,
    CollectionAdminManageAdminGroup,
    CollectionAdminManageItemPolicies,
    CollectionAdminWithdrawItem,
    CollectionAdminReinstateItem,
    CollectionAdminManageCcLicense,
    CommunityAdminManagePolicies,
    CommunityAdminManageAdminGroup,
    CommunityAdminManageCollectionPolicies,
    CommunityAdminManageCollectionTemplateItem,
    CommunityAdminManageCollectionSubmitters,
    CommunityAdminManageCollectionWorkflows,
    CommunityAdminManageCollectionAdminGroup,
    CommunityAdminManageItemPolicies,
    CommunityAdminWithdrawItem,
    CommunityAdminReinstateItem,
    CommunityAdminManageCcLicense,
}

impl Toggle {
    pub const ALL: [Toggle; 22] = [
        Self::ItemAdminManagePolicies,
        Self::ItemAdminManageCcLicense,
        Self::CollectionAdminManagePolicies,
        Self::CollectionAdminManageTemplateItem,
        Self::CollectionAdminManageSubmitters,
        Self::CollectionAdminManageWorkflows,
        Self::CollectionAdminManageAdminGroup,
        Self::CollectionAdminManageItemPolicies,
        Self::CollectionAdminWithdrawItem,
        Self::CollectionAdminReinstateItem,
        Self::CollectionAdminManageCcLicense,
        Self::CommunityAdminManagePolicies,
        Self::CommunityAdminManageAdminGroup,
        Self::CommunityAdminManageCollectionPolicies,
        Self::CommunityAdminManageCollectionTemplateItem,
        Self::CommunityAdminManageCollectionSubmitters,
        Self::CommunityAdminManageCollectionWorkflows,
        Self::CommunityAdminManageCollectionAdminGroup,
        Self::CommunityAdminManageItemPolicies,
        Self::CommunityAdminWithdrawItem,
        Self::CommunityAdminReinstateItem,
        Self::CommunityAdminManageCcLicense,
    ];

    /// The dotted configuration key, e.g. `collection_admin.item_policies`.
    pub fn key(self) -> &'static str {
        match self {
            Self::ItemAdminManagePolicies => "item_admin.policies",
            Self::ItemAdminManageCcLicense => "item_admin.cc_license",
            Self::CollectionAdminManagePolicies => "collection_admin.policies",
            Self::CollectionAdminManageTemplateItem => "collection_admin.template_item",
            Self::CollectionAdminManageSubmitters => "collection_admin.submitters",
            Self::CollectionAdminManageWorkflows => "collection_admin.workflows",
            Self::CollectionAdminManageAdminGroup => "collection_admin.admin_group",
            Self::CollectionAdminManageItemPolicies => "collection_admin.item_policies",
            Self::CollectionAdminWithdrawItem => "collection_admin.item_withdraw",
            Self::CollectionAdminReinstateItem => "collection_admin.item_reinstate",
            Self::CollectionAdminManageCcLicense => "collection_admin.cc_license",
            Self::CommunityAdminManagePolicies => "community_admin.policies",
            Self::CommunityAdminManageAdminGroup => "community_admin.admin_group",
            Self::CommunityAdminManageCollectionPolicies => "community_admin.collection_policies",
            Self::CommunityAdminManageCollectionTemplateItem => {
                "community_admin.collection_template_item"
            }
            Self::CommunityAdminManageCollectionSubmitters => {
                "community_admin.collection_submitters"
            }
            Self::CommunityAdminManageCollectionWorkflows => "community_admin.collection_workflows",
            Self::CommunityAdminManageCollectionAdminGroup => {
                "community_admin.collection_admin_group"
            }
            Self::CommunityAdminManageItemPolicies => "community_admin.item_policies",
            Self::CommunityAdminWithdrawItem => "community_admin.item_withdraw",
            Self::CommunityAdminReinstateItem => "community_admin.item_reinstate",
            Self::CommunityAdminManageCcLicense => "community_admin.cc_license",
        }
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "authorization.{}", self.key())
    }
}

impl FromStr for Toggle {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.strip_prefix("authorization.").unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| ConfigError::ValidationError(format!("unknown toggle: {s}")))
    }
}

impl AuthorizationConfig {
    /// Every toggle disabled: only system administrators may manage anything.
    pub fn strict() -> Self {
        let mut config = Self::default();
        for toggle in Toggle::ALL {
            config.set(toggle, false);
        }
        config
    }

    /// Builder form of [`set`](Self::set) that enables one toggle.
    pub fn enable(mut self, toggle: Toggle) -> Self {
        self.set(toggle, true);
        self
    }

    /// Reads a toggle by name.
    pub fn is_enabled(&self, toggle: Toggle) -> bool {
        *self.slot(toggle)
    }

    pub fn set(&mut self, toggle: Toggle, enabled: bool) {
        *self.slot_mut(toggle) = enabled;
    }

    fn slot(&self, toggle: Toggle) -> &bool {
        let item = &self.item_admin;
        let coll = &self.collection_admin;
        let comm = &self.community_admin;
        match toggle {
            Toggle::ItemAdminManagePolicies => &item.policies,
            Toggle::ItemAdminManageCcLicense => &item.cc_license,
            Toggle::CollectionAdminManagePolicies => &coll.policies,
            Toggle::CollectionAdminManageTemplateItem => &coll.template_item,
            Toggle::CollectionAdminManageSubmitters => &coll.submitters,
            Toggle::CollectionAdminManageWorkflows => &coll.workflows,
            Toggle::CollectionAdminManageAdminGroup => &coll.admin_group,
            Toggle::CollectionAdminManageItemPolicies => &coll.item_policies,
            Toggle::CollectionAdminWithdrawItem => &coll.item_withdraw,
            Toggle::CollectionAdminReinstateItem => &coll.item_reinstate,
            Toggle::CollectionAdminManageCcLicense => &coll.cc_license,
            Toggle::CommunityAdminManagePolicies => &comm.policies,
            Toggle::CommunityAdminManageAdminGroup => &comm.admin_group,
            Toggle::CommunityAdminManageCollectionPolicies => &comm.collection_policies,
            Toggle::CommunityAdminManageCollectionTemplateItem => &comm.collection_template_item,
            Toggle::CommunityAdminManageCollectionSubmitters => &comm.collection_submitters,
            Toggle::CommunityAdminManageCollectionWorkflows => &comm.collection_workflows,
            Toggle::CommunityAdminManageCollectionAdminGroup => &comm.collection_admin_group,
            Toggle::CommunityAdminManageItemPolicies => &comm.item_policies,
            Toggle::CommunityAdminWithdrawItem => &comm.item_withdraw,
            Toggle::CommunityAdminReinstateItem => &comm.item_reinstate,
            Toggle::CommunityAdminManageCcLicense => &comm.cc_license,
        }
    }

    fn slot_mut(&mut self, toggle: Toggle) -> &mut bool {
        let item = &mut self.item_admin;
        let coll = &mut self.collection_admin;
        let comm = &mut self.community_admin;
        match toggle {
            Toggle::ItemAdminManagePolicies => &mut item.policies,
            Toggle::ItemAdminManageCcLicense => &mut item.cc_license,
            Toggle::CollectionAdminManagePolicies => &mut coll.policies,
            Toggle::CollectionAdminManageTemplateItem => &mut coll.template_item,
            Toggle::CollectionAdminManageSubmitters => &mut coll.submitters,
            Toggle::CollectionAdminManageWorkflows => &mut coll.workflows,
            Toggle::CollectionAdminManageAdminGroup => &mut coll.admin_group,
            Toggle::CollectionAdminManageItemPolicies => &mut coll.item_policies,
            Toggle::CollectionAdminWithdrawItem => &mut coll.item_withdraw,
            Toggle::CollectionAdminReinstateItem => &mut coll.item_reinstate,
            Toggle::CollectionAdminManageCcLicense => &mut coll.cc_license,
            Toggle::CommunityAdminManagePolicies => &mut comm.policies,
            Toggle::CommunityAdminManageAdminGroup => &mut comm.admin_group,
            Toggle::CommunityAdminManageCollectionPolicies => &mut comm.collection_policies,
            Toggle::CommunityAdminManageCollectionTemplateItem => {
                &mut comm.collection_template_item
            }
            Toggle::CommunityAdminManageCollectionSubmitters => &mut comm.collection_submitters,
            Toggle::CommunityAdminManageCollectionWorkflows => &mut comm.collection_workflows,
            Toggle::CommunityAdminManageCollectionAdminGroup => &mut comm.collection_admin_group,
            Toggle::CommunityAdminManageItemPolicies => &mut comm.item_policies,
            Toggle::CommunityAdminWithdrawItem => &mut comm.item_withdraw,
            Toggle::CommunityAdminReinstateItem => &mut comm.item_reinstate,
            Toggle::CommunityAdminManageCcLicense => &mut comm.cc_license,
        }
    }
}

// ============================================================================
// Embargo settings
// ============================================================================

/// Embargo vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbargoConfig {
    /// Terms value meaning "embargoed indefinitely".
    pub terms_open: String,
    /// Bundles never embargoed (they stay world-readable).
    pub excluded_bundles: Vec<String>,
    /// Bundles whose own READ grants are not reported by the compliance check.
    /// Their bitstreams are still checked.
    pub unreported_bundles: Vec<String>,
}

impl Default for EmbargoConfig {
    fn default() -> Self {
        Self {
            terms_open: "forever".to_string(),
            excluded_bundles: vec![
                "LICENSE".to_string(),
                "METADATA".to_string(),
                "CC-LICENSE".to_string(),
            ],
            unreported_bundles: vec!["TEXT".to_string(), "THUMBNAIL".to_string()],
        }
    }
}

impl EmbargoConfig {
    pub fn is_excluded(&self, bundle_name: &str) -> bool {
        self.excluded_bundles.iter().any(|b| b == bundle_name)
    }

    pub fn is_unreported(&self, bundle_name: &str) -> bool {
        self.unreported_bundles.iter().any(|b| b == bundle_name)
    }
}
