//! Group membership.
//!
//! Groups nest: a group may contain e-people and other groups. Membership is
//! transitive, and the nesting graph may contain cycles; walks track visited
//! groups and stop.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use vellum_types::{EPersonId, GroupId};

/// Read access to the group directory.
pub trait GroupDirectory: Send + Sync {
    /// Groups listing `actor` as a direct member.
    fn direct_groups(&self, actor: EPersonId) -> BTreeSet<GroupId>;

    /// Groups listing `group` as a direct subgroup.
    fn parent_groups(&self, group: GroupId) -> BTreeSet<GroupId>;

    /// `seeds` plus every group that contains one of them, at any depth.
    fn closure(&self, seeds: BTreeSet<GroupId>) -> BTreeSet<GroupId> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<GroupId> = seeds.into_iter().collect();
        while let Some(group) = queue.pop_front() {
            if seen.insert(group) {
                queue.extend(self.parent_groups(group));
            }
        }
        seen
    }

    /// Every group `actor` belongs to, directly or through nesting.
    /// Does not include Anonymous unless it is nested explicitly.
    fn groups_of(&self, actor: EPersonId) -> BTreeSet<GroupId> {
        self.closure(self.direct_groups(actor))
    }
}

/// In-memory group directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupRegistry {
    #[serde(default)]
    groups: BTreeMap<GroupId, GroupEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GroupEntry {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    members: BTreeSet<EPersonId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    subgroups: BTreeSet<GroupId>,
}

impl GroupRegistry {
    /// A registry holding the two reserved groups.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.add_group(GroupId::ANONYMOUS, "Anonymous");
        registry.add_group(GroupId::ADMINISTRATOR, "Administrator");
        registry
    }

    pub fn add_group(&mut self, id: GroupId, name: impl Into<String>) {
        self.groups.entry(id).or_default().name = name.into();
    }

    pub fn add_member(&mut self, group: GroupId, actor: EPersonId) {
        self.groups.entry(group).or_default().members.insert(actor);
    }

    /// Nests `child` inside `parent`: members of `child` become members of `parent`.
    pub fn add_subgroup(&mut self, parent: GroupId, child: GroupId) {
        self.groups.entry(parent).or_default().subgroups.insert(child);
    }

    pub fn name(&self, group: GroupId) -> Option<&str> {
        self.groups.get(&group).map(|g| g.name.as_str())
    }

    pub fn contains(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }
}

impl GroupDirectory for GroupRegistry {
    fn direct_groups(&self, actor: EPersonId) -> BTreeSet<GroupId> {
        self.groups
            .iter()
            .filter(|(_, g)| g.members.contains(&actor))
            .map(|(id, _)| *id)
            .collect()
    }

    fn parent_groups(&self, group: GroupId) -> BTreeSet<GroupId> {
        self.groups
            .iter()
            .filter(|(_, g)| g.subgroups.contains(&group))
            .map(|(id, _)| *id)
            .collect()
    }
}
