//! # vellum-authz: Hierarchical authorization
//!
//! Decides whether a request may act on an object in the containment
//! hierarchy (community → collection → item → bundle → bitstream):
//! - **Evaluation primitive**: active policies naming the user or one of the
//!   request's groups, with ADMIN inherited down the tree
//! - **Cascade resolver**: configurable delegation of administrative
//!   operations to item, collection and community admins
//! - **Policy service**: policy writes on behalf of the content layer
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Administrative request                      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  CascadeResolver                             │
//! │  ├─ Toggles pick the delegation rung         │
//! │  ├─ Containment resolves the rung's object   │
//! │  └─ One ADMIN check, or system admin only    │
//! └─────────────────┬───────────────────────────┘
//!                   │  Authorizer trait
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  PolicyEvaluator                             │
//! │  ├─ PolicyStore: active policies             │
//! │  ├─ GroupDirectory: transitive membership    │
//! │  └─ Containment: ADMIN inheritance           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//!
//! ```
//! use vellum_authz::{CascadeResolver, ContentGraph, Context, GroupRegistry, PolicyEvaluator};
//! use vellum_config::AuthorizationConfig;
//! use vellum_policy::{InMemoryPolicyStore, NewPolicy, PolicyStore};
//! use vellum_types::{Action, DsoRef, EPersonId, GroupId};
//!
//! let mut graph = ContentGraph::new();
//! graph.add_community(1, "Sciences", &[]).unwrap();
//! graph.add_collection(2, "Theses", &[1]).unwrap();
//! let item = graph.add_item(3, "On Lattices", Some(2)).unwrap();
//!
//! let mut groups = GroupRegistry::new();
//! groups.add_group(GroupId::new(10), "Theses admins");
//! groups.add_member(GroupId::new(10), EPersonId::new(7));
//!
//! let store = InMemoryPolicyStore::new();
//! store
//!     .insert(NewPolicy::new(DsoRef::collection(2), Action::Admin, GroupId::new(10)))
//!     .unwrap();
//!
//! let evaluator = PolicyEvaluator::new(&store, &graph, &groups);
//! let config = AuthorizationConfig::default();
//! let resolver = CascadeResolver::new(&evaluator, &graph, &config);
//!
//! let ctx = Context::for_user(EPersonId::new(7));
//! assert!(resolver.manage_item_policy(&ctx, item).is_ok());
//! assert!(resolver.manage_item_policy(&Context::anonymous(), item).is_err());
//! ```

mod cascade;
mod context;
mod error;
mod evaluator;
mod groups;
pub mod hierarchy;
mod operation;
mod service;

pub use cascade::{CascadeResolver, Grant, GrantPath, Toggles};
pub use context::Context;
pub use error::{AuthorizeError, Result};
pub use evaluator::{Authorizer, PolicyEvaluator};
pub use groups::{GroupDirectory, GroupRegistry};
pub use hierarchy::{Containment, ContentGraph};
pub use operation::Operation;
pub use service::PolicyService;
