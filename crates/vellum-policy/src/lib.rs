//! # vellum-policy: Resource policy records and storage
//!
//! A [`ResourcePolicy`] grants one [`Action`](vellum_types::Action) on one
//! repository object to one [`Principal`](vellum_types::Principal), optionally
//! bounded by a validity window. Embargoes are nothing more than policies with
//! an end date.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Callers (evaluator, policy service,         │
//! │  embargo setter/lifter)                      │
//! └─────────────────┬───────────────────────────┘
//!                   │  PolicyStore trait
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  InMemoryPolicyStore                         │
//! │  ├─ policies: id -> ResourcePolicy           │
//! │  ├─ by_resource: (type, id) -> {policy ids}  │
//! │  └─ one RwLock; bulk ops hold it throughout  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every lookup keys on the `(type, id)` pair of the target object.
//!
//! ## Examples
//!
//! ```
//! use vellum_policy::{InMemoryPolicyStore, NewPolicy, PolicyStore};
//! use vellum_types::{Action, DsoRef, GroupId, Principal};
//!
//! let store = InMemoryPolicyStore::new();
//! let item = DsoRef::item(7);
//! store
//!     .insert(NewPolicy::new(item, Action::Read, Principal::Group(GroupId::ANONYMOUS)))
//!     .unwrap();
//!
//! assert_eq!(store.find_by_resource_and_action(item, Action::Read).unwrap().len(), 1);
//! ```

mod error;
mod memory;
pub mod policy;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryPolicyStore;
pub use policy::{NewPolicy, ResourcePolicy};
pub use store::{PolicyStore, PolicyWrite};
