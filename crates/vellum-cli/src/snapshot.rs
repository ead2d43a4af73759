//! Repository snapshots: the content graph, groups and policies as one JSON file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vellum_authz::{ContentGraph, GroupRegistry};
use vellum_policy::{InMemoryPolicyStore, PolicyStore, ResourcePolicy};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub graph: ContentGraph,
    #[serde(default = "GroupRegistry::new")]
    pub groups: GroupRegistry,
    #[serde(default)]
    pub policies: Vec<ResourcePolicy>,
}

/// A loaded snapshot, ready to answer queries.
pub struct Repository {
    pub graph: ContentGraph,
    pub groups: GroupRegistry,
    pub store: InMemoryPolicyStore,
}

impl Snapshot {
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write snapshot {}", path.display()))
    }

    pub fn into_repository(self) -> Result<Repository> {
        let store = InMemoryPolicyStore::from_policies(self.policies)
            .context("Snapshot holds an invalid policy")?;
        Ok(Repository {
            graph: self.graph,
            groups: self.groups,
            store,
        })
    }
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self> {
        Snapshot::read(path)?.into_repository()
    }

    /// Writes the current state back out, policies in id order.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            graph: self.graph.clone(),
            groups: self.groups.clone(),
            policies: self.store.snapshot()?,
        };
        snapshot.write(path)
    }
}
