//! The embargo service and the object walk shared by its operations.

use vellum_authz::{Authorizer, CascadeResolver, Containment, PolicyService, Toggles};
use vellum_config::EmbargoConfig;
use vellum_policy::PolicyStore;
use vellum_types::DsoRef;

use crate::error::{EmbargoError, Result};
use crate::terms::{self, LiftDate};

/// Sets, checks and lifts embargoes on items.
///
/// Holds no state of its own: every operation reads the policy store and the
/// containment graph it was built with.
pub struct EmbargoService<'a> {
    pub(crate) store: &'a dyn PolicyStore,
    pub(crate) graph: &'a dyn Containment,
    pub(crate) policies: PolicyService<'a>,
    pub(crate) resolver: CascadeResolver<'a>,
    pub(crate) config: &'a EmbargoConfig,
}

/// A bundle the embargo applies to, with its bitstreams.
#[derive(Debug, Clone)]
pub(crate) struct EmbargoedBundle {
    pub bundle: DsoRef,
    pub name: String,
    pub bitstreams: Vec<DsoRef>,
}

impl<'a> EmbargoService<'a> {
    pub fn new(
        store: &'a dyn PolicyStore,
        graph: &'a dyn Containment,
        authorizer: &'a dyn Authorizer,
        toggles: &'a dyn Toggles,
        config: &'a EmbargoConfig,
    ) -> Self {
        Self {
            store,
            graph,
            policies: PolicyService::new(store, graph),
            resolver: CascadeResolver::new(authorizer, graph, toggles),
            config,
        }
    }

    /// Parses terms against the configured open-ended token.
    pub fn parse_terms(&self, terms: Option<&str>) -> Result<Option<LiftDate>> {
        terms::parse_terms(terms, &self.config.terms_open)
    }

    /// The item's bundles outside the excluded set, in id order.
    pub(crate) fn embargoed_bundles(&self, item: DsoRef) -> Vec<EmbargoedBundle> {
        self.graph
            .bundles_of(item)
            .into_iter()
            .filter_map(|bundle| {
                let name = self.graph.name(bundle).unwrap_or_default();
                (!self.config.is_excluded(&name)).then(|| EmbargoedBundle {
                    bundle,
                    bitstreams: self.graph.bitstreams_of(bundle),
                    name,
                })
            })
            .collect()
    }

    pub(crate) fn owning_collection(&self, item: DsoRef) -> Result<DsoRef> {
        self.graph
            .owning_collection(item)
            .ok_or_else(|| EmbargoError::invariant(format!("{item} has no owning collection")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_authz::{ContentGraph, GroupRegistry, PolicyEvaluator};
    use vellum_config::AuthorizationConfig;
    use vellum_policy::InMemoryPolicyStore;

    fn graph() -> ContentGraph {
        let mut graph = ContentGraph::new();
        graph.add_collection(2, "Coll", &[]).unwrap();
        graph.add_item(3, "Item", Some(2)).unwrap();
        graph.add_bundle(4, "ORIGINAL", Some(3)).unwrap();
        graph.add_bundle(5, "LICENSE", Some(3)).unwrap();
        graph.add_bundle(6, "PRESERVATION", Some(3)).unwrap();
        graph.add_bitstream(7, "a.pdf", &[4, 6]).unwrap();
        graph
    }

    #[test]
    fn test_embargoed_bundles_follow_configuration() {
        let (store, graph, groups) = (InMemoryPolicyStore::new(), graph(), GroupRegistry::new());
        let evaluator = PolicyEvaluator::new(&store, &graph, &groups);
        let toggles = AuthorizationConfig::default();

        let config = EmbargoConfig::default();
        let service = EmbargoService::new(&store, &graph, &evaluator, &toggles, &config);
        let names: Vec<String> = service
            .embargoed_bundles(DsoRef::item(3))
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["ORIGINAL", "PRESERVATION"]);

        let config = EmbargoConfig {
            excluded_bundles: vec!["PRESERVATION".to_string()],
            ..EmbargoConfig::default()
        };
        let service = EmbargoService::new(&store, &graph, &evaluator, &toggles, &config);
        let bundles = service.embargoed_bundles(DsoRef::item(3));
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[1].name, "LICENSE");
        assert_eq!(bundles[0].bitstreams, vec![DsoRef::bitstream(7)]);
    }

    #[test]
    fn test_terms_use_configured_token() {
        let (store, graph, groups) = (InMemoryPolicyStore::new(), graph(), GroupRegistry::new());
        let evaluator = PolicyEvaluator::new(&store, &graph, &groups);
        let toggles = AuthorizationConfig::default();
        let config = EmbargoConfig {
            terms_open: "indefinite".to_string(),
            ..EmbargoConfig::default()
        };
        let service = EmbargoService::new(&store, &graph, &evaluator, &toggles, &config);

        assert_eq!(service.parse_terms(Some("indefinite")).unwrap(), Some(LiftDate::Forever));
        assert!(service.parse_terms(Some("forever")).is_err());
    }

    #[test]
    fn test_missing_owning_collection() {
        let (store, mut graph, groups) = (InMemoryPolicyStore::new(), graph(), GroupRegistry::new());
        graph.add_item(9, "Loose", None).unwrap();
        let evaluator = PolicyEvaluator::new(&store, &graph, &groups);
        let toggles = AuthorizationConfig::default();
        let config = EmbargoConfig::default();
        let service = EmbargoService::new(&store, &graph, &evaluator, &toggles, &config);

        assert_eq!(service.owning_collection(DsoRef::item(3)).unwrap(), DsoRef::collection(2));
        assert!(matches!(
            service.owning_collection(DsoRef::item(9)),
            Err(EmbargoError::InvariantViolation(_))
        ));
    }
}
