//! The containment hierarchy.
//!
//! ```text
//! community ─┬─> community ...
//!            └─> collection ──> item ──> bundle ──> bitstream
//! ```
//!
//! The hierarchy is a DAG: collections may sit in several communities, an
//! item has one owning collection plus any number of mapped ones, and a
//! bitstream may be shared between bundles. Wherever a single parent is
//! needed, "first" means lowest id.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use vellum_types::{DsoRef, ResourceType};

use crate::error::{AuthorizeError, Result};

/// Read access to the object graph.
///
/// All lists are ordered by id.
pub trait Containment: Send + Sync {
    fn exists(&self, object: DsoRef) -> bool;

    /// Display name, e.g. the bundle name `ORIGINAL`.
    fn name(&self, object: DsoRef) -> Option<String>;

    fn owning_collection(&self, item: DsoRef) -> Option<DsoRef>;

    /// Owning plus mapped collections.
    fn collections_of(&self, item: DsoRef) -> Vec<DsoRef>;

    /// Parent communities of a collection or community.
    fn parent_communities(&self, object: DsoRef) -> Vec<DsoRef>;

    fn bundles_of(&self, item: DsoRef) -> Vec<DsoRef>;

    fn bitstreams_of(&self, bundle: DsoRef) -> Vec<DsoRef>;

    fn bundles_of_bitstream(&self, bitstream: DsoRef) -> Vec<DsoRef>;

    fn items_of_bundle(&self, bundle: DsoRef) -> Vec<DsoRef>;

    fn first_parent_community(&self, object: DsoRef) -> Option<DsoRef> {
        self.parent_communities(object).into_iter().next()
    }

    /// Every direct container of `object`, the edges admin inheritance follows.
    fn parents(&self, object: DsoRef) -> Vec<DsoRef> {
        match object.resource_type {
            ResourceType::Bitstream => self.bundles_of_bitstream(object),
            ResourceType::Bundle => self.items_of_bundle(object),
            ResourceType::Item => self.collections_of(object),
            ResourceType::Collection | ResourceType::Community => {
                self.parent_communities(object)
            }
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// ContentGraph
// ============================================================================

/// In-memory containment graph.
///
/// Serializes as flat per-type record lists (see [`GraphRecords`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphRecords", into = "GraphRecords")]
pub struct ContentGraph {
    names: BTreeMap<DsoRef, String>,
    parents: BTreeMap<DsoRef, BTreeSet<DsoRef>>,
    children: BTreeMap<DsoRef, BTreeSet<DsoRef>>,
    owning: BTreeMap<DsoRef, DsoRef>,
}

impl ContentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_community(&mut self, id: u64, name: &str, parents: &[u64]) -> Result<DsoRef> {
        let parents: Vec<DsoRef> = parents.iter().map(|p| DsoRef::community(*p)).collect();
        self.attach(DsoRef::community(id), name, &parents)
    }

    pub fn add_collection(&mut self, id: u64, name: &str, communities: &[u64]) -> Result<DsoRef> {
        let parents: Vec<DsoRef> = communities.iter().map(|c| DsoRef::community(*c)).collect();
        self.attach(DsoRef::collection(id), name, &parents)
    }

    /// Adds an item owned by `owning_collection`.
    pub fn add_item(&mut self, id: u64, name: &str, owning_collection: Option<u64>) -> Result<DsoRef> {
        let owner = owning_collection.map(DsoRef::collection);
        let item = self.attach(DsoRef::item(id), name, owner.as_slice())?;
        if let Some(owner) = owner {
            self.owning.insert(item, owner);
        }
        Ok(item)
    }

    /// Maps an existing item into a further, non-owning collection.
    pub fn map_item(&mut self, item: u64, collection: u64) -> Result<()> {
        self.link(DsoRef::collection(collection), DsoRef::item(item))
    }

    pub fn add_bundle(&mut self, id: u64, name: &str, item: Option<u64>) -> Result<DsoRef> {
        let parent = item.map(DsoRef::item);
        self.attach(DsoRef::bundle(id), name, parent.as_slice())
    }

    pub fn add_bitstream(&mut self, id: u64, name: &str, bundles: &[u64]) -> Result<DsoRef> {
        let parents: Vec<DsoRef> = bundles.iter().map(|b| DsoRef::bundle(*b)).collect();
        self.attach(DsoRef::bitstream(id), name, &parents)
    }

    /// Adds `object` under `parents`, validating every edge before mutating.
    fn attach(&mut self, object: DsoRef, name: &str, parents: &[DsoRef]) -> Result<DsoRef> {
        if self.names.contains_key(&object) {
            return Err(AuthorizeError::invariant(format!("{object} already exists")));
        }
        for parent in parents {
            self.check_edge(*parent, object)?;
        }
        self.names.insert(object, name.to_string());
        for parent in parents {
            self.connect(*parent, object);
        }
        Ok(object)
    }

    fn link(&mut self, parent: DsoRef, child: DsoRef) -> Result<()> {
        self.check_edge(parent, child)?;
        if !self.names.contains_key(&child) {
            return Err(AuthorizeError::invariant(format!("{child} does not exist")));
        }
        self.connect(parent, child);
        Ok(())
    }

    fn check_edge(&self, parent: DsoRef, child: DsoRef) -> Result<()> {
        use ResourceType::{Bitstream, Bundle, Collection, Community, Item};
        let allowed = matches!(
            (parent.resource_type, child.resource_type),
            (Community, Community | Collection)
                | (Collection, Item)
                | (Item, Bundle)
                | (Bundle, Bitstream)
        );
        if !allowed {
            return Err(AuthorizeError::invariant(format!(
                "{child} cannot be contained in {parent}"
            )));
        }
        if !self.names.contains_key(&parent) {
            return Err(AuthorizeError::invariant(format!("{parent} does not exist")));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(AuthorizeError::invariant(format!(
                "{child} cannot be contained in its own descendant {parent}"
            )));
        }
        Ok(())
    }

    /// Whether `ancestor` is `object` or reachable from it along parent edges.
    fn is_ancestor_or_self(&self, ancestor: DsoRef, object: DsoRef) -> bool {
        let mut seen = BTreeSet::new();
        let mut pending = vec![object];
        while let Some(next) = pending.pop() {
            if next == ancestor {
                return true;
            }
            if seen.insert(next) {
                if let Some(parents) = self.parents.get(&next) {
                    pending.extend(parents.iter().copied());
                }
            }
        }
        false
    }

    fn connect(&mut self, parent: DsoRef, child: DsoRef) {
        self.parents.entry(child).or_default().insert(parent);
        self.children.entry(parent).or_default().insert(child);
    }

    fn insert_object(&mut self, object: DsoRef, name: &str) -> Result<()> {
        if self.names.insert(object, name.to_string()).is_some() {
            return Err(AuthorizeError::invariant(format!("{object} listed twice")));
        }
        Ok(())
    }

    fn parents_of(&self, object: DsoRef, kind: ResourceType) -> Vec<DsoRef> {
        self.parents
            .get(&object)
            .map(|set| set.iter().copied().filter(|p| p.is(kind)).collect())
            .unwrap_or_default()
    }

    fn children_of(&self, object: DsoRef, kind: ResourceType) -> Vec<DsoRef> {
        self.children
            .get(&object)
            .map(|set| set.iter().copied().filter(|c| c.is(kind)).collect())
            .unwrap_or_default()
    }

    fn objects_of(&self, kind: ResourceType) -> impl Iterator<Item = (DsoRef, &String)> + '_ {
        self.names
            .iter()
            .filter(move |(object, _)| object.is(kind))
            .map(|(object, name)| (*object, name))
    }
}

impl Containment for ContentGraph {
    fn exists(&self, object: DsoRef) -> bool {
        self.names.contains_key(&object)
    }

    fn name(&self, object: DsoRef) -> Option<String> {
        self.names.get(&object).cloned()
    }

    fn owning_collection(&self, item: DsoRef) -> Option<DsoRef> {
        self.owning.get(&item).copied()
    }

    fn collections_of(&self, item: DsoRef) -> Vec<DsoRef> {
        self.parents_of(item, ResourceType::Collection)
    }

    fn parent_communities(&self, object: DsoRef) -> Vec<DsoRef> {
        self.parents_of(object, ResourceType::Community)
    }

    fn bundles_of(&self, item: DsoRef) -> Vec<DsoRef> {
        self.children_of(item, ResourceType::Bundle)
    }

    fn bitstreams_of(&self, bundle: DsoRef) -> Vec<DsoRef> {
        self.children_of(bundle, ResourceType::Bitstream)
    }

    fn bundles_of_bitstream(&self, bitstream: DsoRef) -> Vec<DsoRef> {
        self.parents_of(bitstream, ResourceType::Bundle)
    }

    fn items_of_bundle(&self, bundle: DsoRef) -> Vec<DsoRef> {
        self.parents_of(bundle, ResourceType::Item)
    }
}

// ============================================================================
// Serialized form
// ============================================================================

/// Flat, hand-editable form of a [`ContentGraph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphRecords {
    pub communities: Vec<CommunityRecord>,
    pub collections: Vec<CollectionRecord>,
    pub items: Vec<ItemRecord>,
    pub bundles: Vec<BundleRecord>,
    pub bitstreams: Vec<BitstreamRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityRecord {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub communities: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: u64,
    pub name: String,
    pub owning_collection: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mapped_collections: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleRecord {
    pub id: u64,
    pub name: String,
    pub item: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitstreamRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub bundles: Vec<u64>,
}

impl TryFrom<GraphRecords> for ContentGraph {
    type Error = AuthorizeError;

    fn try_from(records: GraphRecords) -> Result<Self> {
        let mut graph = ContentGraph::new();
        // Objects first, edges second: records may list children before parents.
        for c in &records.communities {
            graph.insert_object(DsoRef::community(c.id), &c.name)?;
        }
        for c in &records.collections {
            graph.insert_object(DsoRef::collection(c.id), &c.name)?;
        }
        for i in &records.items {
            graph.insert_object(DsoRef::item(i.id), &i.name)?;
        }
        for b in &records.bundles {
            graph.insert_object(DsoRef::bundle(b.id), &b.name)?;
        }
        for b in &records.bitstreams {
            graph.insert_object(DsoRef::bitstream(b.id), &b.name)?;
        }

        for c in &records.communities {
            for parent in &c.parents {
                graph.link(DsoRef::community(*parent), DsoRef::community(c.id))?;
            }
        }
        for c in &records.collections {
            for community in &c.communities {
                graph.link(DsoRef::community(*community), DsoRef::collection(c.id))?;
            }
        }
        for i in &records.items {
            let item = DsoRef::item(i.id);
            if let Some(owner) = i.owning_collection {
                graph.link(DsoRef::collection(owner), item)?;
                graph.owning.insert(item, DsoRef::collection(owner));
            }
            for mapped in &i.mapped_collections {
                graph.link(DsoRef::collection(*mapped), item)?;
            }
        }
        for b in &records.bundles {
            if let Some(item) = b.item {
                graph.link(DsoRef::item(item), DsoRef::bundle(b.id))?;
            }
        }
        for b in &records.bitstreams {
            for bundle in &b.bundles {
                graph.link(DsoRef::bundle(*bundle), DsoRef::bitstream(b.id))?;
            }
        }
        Ok(graph)
    }
}

impl From<ContentGraph> for GraphRecords {
    fn from(graph: ContentGraph) -> Self {
        let ids = |objects: Vec<DsoRef>| -> Vec<u64> { objects.into_iter().map(|o| o.id.as_u64()).collect() };
        let mut records = GraphRecords::default();
        for (object, name) in graph.objects_of(ResourceType::Community) {
            records.communities.push(CommunityRecord {
                id: object.id.as_u64(),
                name: name.clone(),
                parents: ids(graph.parent_communities(object)),
            });
        }
        for (object, name) in graph.objects_of(ResourceType::Collection) {
            records.collections.push(CollectionRecord {
                id: object.id.as_u64(),
                name: name.clone(),
                communities: ids(graph.parent_communities(object)),
            });
        }
        for (object, name) in graph.objects_of(ResourceType::Item) {
            let owner = graph.owning_collection(object);
            let mapped = graph
                .collections_of(object)
                .into_iter()
                .filter(|c| Some(*c) != owner)
                .collect();
            records.items.push(ItemRecord {
                id: object.id.as_u64(),
                name: name.clone(),
                owning_collection: owner.map(|c| c.id.as_u64()),
                mapped_collections: ids(mapped),
            });
        }
        for (object, name) in graph.objects_of(ResourceType::Bundle) {
            records.bundles.push(BundleRecord {
                id: object.id.as_u64(),
                name: name.clone(),
                item: graph.items_of_bundle(object).first().map(|i| i.id.as_u64()),
            });
        }
        for (object, name) in graph.objects_of(ResourceType::Bitstream) {
            records.bitstreams.push(BitstreamRecord {
                id: object.id.as_u64(),
                name: name.clone(),
                bundles: ids(graph.bundles_of_bitstream(object)),
            });
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn sample() -> ContentGraph {
        let mut graph = ContentGraph::new();
        graph.add_community(1, "Sciences", &[]).unwrap();
        graph.add_community(2, "Physics", &[1]).unwrap();
        graph.add_collection(10, "Theses", &[2, 1]).unwrap();
        graph.add_collection(11, "Preprints", &[2]).unwrap();
        graph.add_item(100, "On Lattices", Some(11)).unwrap();
        graph.map_item(100, 10).unwrap();
        graph.add_bundle(200, "ORIGINAL", Some(100)).unwrap();
        graph.add_bundle(201, "LICENSE", Some(100)).unwrap();
        graph.add_bitstream(300, "thesis.pdf", &[200]).unwrap();
        graph
    }

    #[test]
    fn test_first_parent_is_lowest_id() {
        let graph = sample();
        assert_eq!(
            graph.first_parent_community(DsoRef::collection(10)),
            Some(DsoRef::community(1))
        );
        assert_eq!(
            graph.collections_of(DsoRef::item(100)),
            vec![DsoRef::collection(10), DsoRef::collection(11)]
        );
        assert_eq!(graph.owning_collection(DsoRef::item(100)), Some(DsoRef::collection(11)));
    }

    #[test]
    fn test_parents_follow_containment() {
        let graph = sample();
        assert_eq!(graph.parents(DsoRef::bitstream(300)), vec![DsoRef::bundle(200)]);
        assert_eq!(graph.parents(DsoRef::bundle(200)), vec![DsoRef::item(100)]);
        assert!(graph.parents(DsoRef::community(1)).is_empty());
        assert_eq!(graph.name(DsoRef::bundle(201)).as_deref(), Some("LICENSE"));
    }

    #[test]
    fn test_rejects_bad_edges() {
        let mut graph = sample();
        assert!(graph.add_bundle(202, "TEXT", Some(999)).is_err());
        assert!(!graph.exists(DsoRef::bundle(202)));
        assert!(graph.add_collection(10, "dup", &[]).is_err());
        assert!(graph.link(DsoRef::item(100), DsoRef::collection(11)).is_err());
    }

    #[test]
    fn test_rejects_containment_cycles() {
        let mut graph = sample();
        assert!(graph.link(DsoRef::community(2), DsoRef::community(1)).is_err());
        assert!(graph.link(DsoRef::community(1), DsoRef::community(1)).is_err());
        assert!(graph.parent_communities(DsoRef::community(1)).is_empty());

        graph.add_community(3, "Optics", &[2]).unwrap();
        assert!(matches!(
            graph.link(DsoRef::community(3), DsoRef::community(1)),
            Err(AuthorizeError::InvariantViolation(_))
        ));
    }

    #[test_case(r#"{"communities": [{"id": 1, "name": "Top", "parents": [1]}]}"# ; "own parent")]
    #[test_case(r#"{"communities": [
        {"id": 1, "name": "A", "parents": [2]},
        {"id": 2, "name": "B", "parents": [1]}
    ]}"# ; "two-community loop")]
    fn test_records_reject_cycles(json: &str) {
        assert!(serde_json::from_str::<ContentGraph>(json).is_err());
    }

    #[test]
    fn test_records_round_trip_through_json() {
        let graph = sample();
        let json = serde_json::to_string(&graph).unwrap();
        let back: ContentGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.owning_collection(DsoRef::item(100)), Some(DsoRef::collection(11)));
        assert_eq!(back.collections_of(DsoRef::item(100)).len(), 2);
        assert_eq!(back.bitstreams_of(DsoRef::bundle(200)), vec![DsoRef::bitstream(300)]);
    }

    #[test]
    fn test_records_may_list_children_first() {
        let json = r#"{
            "bitstreams": [{"id": 5, "name": "a.pdf", "bundles": [4]}],
            "bundles": [{"id": 4, "name": "ORIGINAL", "item": 3}],
            "items": [{"id": 3, "name": "Item", "owning_collection": 2}],
            "collections": [{"id": 2, "name": "Coll", "communities": [1]}],
            "communities": [{"id": 1, "name": "Top"}]
        }"#;
        let graph: ContentGraph = serde_json::from_str(json).unwrap();
        assert_eq!(graph.bundles_of_bitstream(DsoRef::bitstream(5)), vec![DsoRef::bundle(4)]);
    }
}
