//! # vellum-embargo: Time-bounded access to item content
//!
//! An embargo is ordinary policy data with an expiry. Setting one writes READ
//! grants that end on the lift date; lifting one puts the collection's
//! default read access back.
//!
//! - **Terms**: the open-ended token, or a (possibly partial) lift date
//! - **Set**: READ grants ending on the lift date, on every non-excluded
//!   bundle and bitstream, refreshed in place on renewal
//! - **Check**: read-only report of unbounded READ grants
//! - **Lift**: unbounded `Inherited` READ for the default read groups
//!
//! ## Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use vellum_authz::{ContentGraph, Context, GroupRegistry, PolicyEvaluator};
//! use vellum_config::VellumConfig;
//! use vellum_embargo::EmbargoService;
//! use vellum_policy::{InMemoryPolicyStore, NewPolicy, PolicyStore};
//! use vellum_types::{Action, DsoRef, GroupId};
//!
//! let mut graph = ContentGraph::new();
//! graph.add_collection(2, "Theses", &[]).unwrap();
//! let item = graph.add_item(3, "On Lattices", Some(2)).unwrap();
//! graph.add_bundle(4, "ORIGINAL", Some(3)).unwrap();
//! graph.add_bitstream(5, "thesis.pdf", &[4]).unwrap();
//!
//! let store = InMemoryPolicyStore::new();
//! store
//!     .insert(NewPolicy::new(DsoRef::collection(2), Action::DefaultItemRead, GroupId::ANONYMOUS))
//!     .unwrap();
//!
//! let groups = GroupRegistry::new();
//! let evaluator = PolicyEvaluator::new(&store, &graph, &groups);
//! let config = VellumConfig::default();
//! let embargo = EmbargoService::new(&store, &graph, &evaluator, &config.authorization, &config.embargo);
//!
//! let ctx = Context::anonymous().ignoring_authorization();
//! let outcome = embargo.set_embargo(&ctx, item, Some("2030-01-01")).unwrap();
//! assert_eq!(outcome.policies.len(), 2);
//! assert_eq!(outcome.policies[0].end_date(), NaiveDate::from_ymd_opt(2030, 1, 1));
//! assert!(embargo.check_embargo(&ctx, item).unwrap().is_empty());
//! ```

mod audit;
mod error;
mod lifter;
mod service;
mod setter;
pub mod terms;

pub use audit::Violation;
pub use error::{EmbargoError, Result};
pub use lifter::LiftOutcome;
pub use service::EmbargoService;
pub use setter::EmbargoOutcome;
pub use terms::{LiftDate, parse_terms};
