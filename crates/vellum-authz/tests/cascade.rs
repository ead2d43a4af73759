//! Delegation ladder behaviour, observed through a recording authorizer.

use std::sync::Mutex;

use test_case::test_case;
use vellum_authz::{
    AuthorizeError, Authorizer, CascadeResolver, ContentGraph, Context, Grant, GrantPath,
    GroupRegistry, Operation, PolicyEvaluator, Result,
};
use vellum_config::{AuthorizationConfig, Toggle};
use vellum_policy::{InMemoryPolicyStore, NewPolicy, PolicyStore};
use vellum_types::{Action, DsoRef, EPersonId, GroupId, ResourceType};

// ============================================================================
// Fixtures
// ============================================================================

/// Answers from a fixed grant list and records every question.
#[derive(Default)]
struct Spy {
    system_admin: bool,
    grant_all: bool,
    granted: Vec<(DsoRef, Action)>,
    calls: Mutex<Vec<(DsoRef, Action, bool)>>,
    admin_checks: Mutex<usize>,
}

impl Spy {
    fn granting_all() -> Self {
        Self {
            grant_all: true,
            ..Self::default()
        }
    }

    fn granting(granted: &[(DsoRef, Action)]) -> Self {
        Self {
            granted: granted.to_vec(),
            ..Self::default()
        }
    }

    fn system_admin() -> Self {
        Self {
            system_admin: true,
            ..Self::default()
        }
    }

    fn calls_for(&self, action: Action) -> Vec<DsoRef> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, a, _)| *a == action)
            .map(|(object, _, _)| *object)
            .collect()
    }

    fn admin_checks(&self) -> usize {
        *self.admin_checks.lock().unwrap()
    }
}

impl Authorizer for Spy {
    fn is_admin(&self, _ctx: &Context) -> Result<bool> {
        *self.admin_checks.lock().unwrap() += 1;
        Ok(self.system_admin)
    }

    fn authorize_boolean(
        &self,
        _ctx: &Context,
        object: DsoRef,
        action: Action,
        use_inheritance: bool,
    ) -> Result<bool> {
        self.calls
            .lock()
            .unwrap()
            .push((object, action, use_inheritance));
        Ok(self.grant_all || self.granted.contains(&(object, action)))
    }
}

/// ```text
/// community 1 ─┬─ collection 2 (owning) ── item 3 ── bundle 4 ── bitstream 5
/// community 8 ─┘                          │
/// community 1 ─── collection 6 (mapped) ──┘
/// community 9 (child of 1)
/// collection 7 (no community) ── item 11
/// ```
fn graph() -> ContentGraph {
    let mut graph = ContentGraph::new();
    graph.add_community(1, "Sciences", &[]).unwrap();
    graph.add_community(8, "Archive", &[]).unwrap();
    graph.add_community(9, "Physics", &[1]).unwrap();
    graph.add_collection(2, "Theses", &[8, 1]).unwrap();
    graph.add_collection(6, "Featured", &[1]).unwrap();
    graph.add_collection(7, "Orphans", &[]).unwrap();
    graph.add_item(3, "On Lattices", Some(2)).unwrap();
    graph.map_item(3, 6).unwrap();
    graph.add_item(10, "Lost", None).unwrap();
    graph.add_item(11, "Unfiled", Some(7)).unwrap();
    graph.add_bundle(4, "ORIGINAL", Some(3)).unwrap();
    graph.add_bitstream(5, "thesis.pdf", &[4]).unwrap();
    graph
}

const ITEM: DsoRef = DsoRef {
    resource_type: ResourceType::Item,
    id: vellum_types::ResourceId::new(3),
};

fn ctx() -> Context {
    Context::for_user(EPersonId::new(42))
}

fn only(toggle: Toggle) -> AuthorizationConfig {
    AuthorizationConfig::strict().enable(toggle)
}

// ============================================================================
// One toggle, one check
// ============================================================================

#[test_case(Toggle::ItemAdminManagePolicies, DsoRef::item(3) ; "item admin")]
#[test_case(Toggle::CollectionAdminManageItemPolicies, DsoRef::collection(2) ; "owning collection admin")]
#[test_case(Toggle::CommunityAdminManageItemPolicies, DsoRef::community(1) ; "first community of owning collection")]
fn test_item_policy_routes_to_single_level(toggle: Toggle, expected: DsoRef) {
    let graph = graph();
    let config = only(toggle);

    let spy = Spy::granting_all();
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .manage_item_policy(&ctx(), ITEM)
        .unwrap();
    assert_eq!(spy.calls_for(Action::Admin), vec![expected]);
    assert_eq!(grant.path, GrantPath::Admin(expected));
    assert_eq!(spy.admin_checks(), 0);

    // A failed check is final: no other rung and no system-admin fallback.
    let spy = Spy::default();
    let err = CascadeResolver::new(&spy, &graph, &config)
        .manage_item_policy(&ctx(), ITEM)
        .unwrap_err();
    assert_eq!(spy.calls_for(Action::Admin), vec![expected]);
    assert_eq!(spy.admin_checks(), 0);
    assert!(matches!(
        err,
        AuthorizeError::Denied {
            operation: Operation::ManageItemPolicy,
            ..
        }
    ));
}

#[test_case(Toggle::CollectionAdminManagePolicies, DsoRef::collection(2) ; "collection admin")]
#[test_case(Toggle::CommunityAdminManageCollectionPolicies, DsoRef::community(1) ; "parent community admin")]
fn test_collection_policy_routes_to_single_level(toggle: Toggle, expected: DsoRef) {
    let graph = graph();
    let config = only(toggle);
    let spy = Spy::granting_all();
    CascadeResolver::new(&spy, &graph, &config)
        .manage_collection_policy(&ctx(), DsoRef::collection(2))
        .unwrap();
    assert_eq!(spy.calls_for(Action::Admin), vec![expected]);
}

fn run(resolver: &CascadeResolver<'_>, op: Operation, subject: DsoRef) -> Result<Grant> {
    let ctx = ctx();
    match op {
        Operation::ManageCollectionPolicy => resolver.manage_collection_policy(&ctx, subject),
        Operation::ManageCommunityPolicy => resolver.manage_community_policy(&ctx, subject),
        Operation::ManageTemplateItem => resolver.manage_template_item(&ctx, subject),
        Operation::ManageSubmittersGroup => resolver.manage_submitters_group(&ctx, subject),
        Operation::ManageWorkflowsGroup => resolver.manage_workflows_group(&ctx, subject),
        Operation::ManageCollectionAdminGroup => {
            resolver.manage_collection_admin_group(&ctx, subject)
        }
        Operation::ManageCommunityAdminGroup => resolver.manage_community_admin_group(&ctx, subject),
        other => unreachable!("{other} is not routed by this table"),
    }
}

#[test_case(Operation::ManageCollectionPolicy, Toggle::CollectionAdminManagePolicies, DsoRef::collection(2), DsoRef::collection(2) ; "collection policy, collection admin")]
#[test_case(Operation::ManageCollectionPolicy, Toggle::CommunityAdminManageCollectionPolicies, DsoRef::collection(2), DsoRef::community(1) ; "collection policy, community admin")]
#[test_case(Operation::ManageCommunityPolicy, Toggle::CommunityAdminManagePolicies, DsoRef::community(9), DsoRef::community(9) ; "community policy")]
#[test_case(Operation::ManageTemplateItem, Toggle::CollectionAdminManageTemplateItem, DsoRef::collection(2), DsoRef::collection(2) ; "template item, collection admin")]
#[test_case(Operation::ManageTemplateItem, Toggle::CommunityAdminManageCollectionTemplateItem, DsoRef::collection(2), DsoRef::community(1) ; "template item, community admin")]
#[test_case(Operation::ManageSubmittersGroup, Toggle::CollectionAdminManageSubmitters, DsoRef::collection(2), DsoRef::collection(2) ; "submitters, collection admin")]
#[test_case(Operation::ManageSubmittersGroup, Toggle::CommunityAdminManageCollectionSubmitters, DsoRef::collection(2), DsoRef::community(1) ; "submitters, community admin")]
#[test_case(Operation::ManageWorkflowsGroup, Toggle::CollectionAdminManageWorkflows, DsoRef::collection(2), DsoRef::collection(2) ; "workflows, collection admin")]
#[test_case(Operation::ManageWorkflowsGroup, Toggle::CommunityAdminManageCollectionWorkflows, DsoRef::collection(2), DsoRef::community(1) ; "workflows, community admin")]
#[test_case(Operation::ManageCollectionAdminGroup, Toggle::CollectionAdminManageAdminGroup, DsoRef::collection(2), DsoRef::collection(2) ; "collection admin group, collection admin")]
#[test_case(Operation::ManageCollectionAdminGroup, Toggle::CommunityAdminManageCollectionAdminGroup, DsoRef::collection(2), DsoRef::community(1) ; "collection admin group, community admin")]
#[test_case(Operation::ManageCommunityAdminGroup, Toggle::CommunityAdminManageAdminGroup, DsoRef::community(9), DsoRef::community(9) ; "community admin group")]
fn test_operation_routes_to_single_level(
    op: Operation,
    toggle: Toggle,
    subject: DsoRef,
    expected: DsoRef,
) {
    let graph = graph();
    let config = only(toggle);

    // ADMIN on the expected level only, so the can-edit query never succeeds.
    let spy = Spy::granting(&[(expected, Action::Admin)]);
    let grant = run(&CascadeResolver::new(&spy, &graph, &config), op, subject).unwrap();
    assert_eq!(grant.operation, op);
    assert_eq!(grant.path, GrantPath::Admin(expected));
    assert_eq!(spy.calls_for(Action::Admin), vec![expected]);
    assert_eq!(spy.admin_checks(), 0);

    let spy = Spy::default();
    let err = run(&CascadeResolver::new(&spy, &graph, &config), op, subject).unwrap_err();
    assert_eq!(spy.calls_for(Action::Admin), vec![expected]);
    assert_eq!(spy.admin_checks(), 0);
    assert!(matches!(err, AuthorizeError::Denied { operation, .. } if operation == op));
}

#[test]
fn test_earlier_rung_wins_when_several_enabled() {
    let graph = graph();
    let config = AuthorizationConfig::default();
    let spy = Spy::granting_all();
    CascadeResolver::new(&spy, &graph, &config)
        .manage_item_policy(&ctx(), ITEM)
        .unwrap();
    assert_eq!(spy.calls_for(Action::Admin), vec![ITEM]);
}

#[test]
fn test_no_toggle_requires_system_admin() {
    let graph = graph();
    let config = AuthorizationConfig::strict();

    let spy = Spy::granting_all();
    let err = CascadeResolver::new(&spy, &graph, &config)
        .manage_community_policy(&ctx(), DsoRef::community(1))
        .unwrap_err();
    assert!(spy.calls_for(Action::Admin).is_empty());
    assert_eq!(
        err.to_string(),
        "eperson 42 is not authorized to manage-community-policy"
    );

    let spy = Spy::system_admin();
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .manage_community_policy(&ctx(), DsoRef::community(1))
        .unwrap();
    assert_eq!(grant.path, GrantPath::SystemAdmin);
    assert_eq!(grant.operation, Operation::ManageCommunityPolicy);
}

#[test]
fn test_bitstream_and_bundle_resolve_to_item() {
    let graph = graph();
    let config = only(Toggle::ItemAdminManagePolicies);
    let spy = Spy::granting_all();
    let resolver = CascadeResolver::new(&spy, &graph, &config);
    resolver.manage_bitstream_policy(&ctx(), DsoRef::bitstream(5)).unwrap();
    resolver.manage_bundle_policy(&ctx(), DsoRef::bundle(4)).unwrap();
    assert_eq!(spy.calls_for(Action::Admin), vec![ITEM, ITEM]);
}

// ============================================================================
// Missing parents
// ============================================================================

#[test]
fn test_missing_owning_collection_is_invariant_violation() {
    let graph = graph();
    let config = only(Toggle::CollectionAdminManageItemPolicies);
    let spy = Spy::granting_all();
    let err = CascadeResolver::new(&spy, &graph, &config)
        .manage_item_policy(&ctx(), DsoRef::item(10))
        .unwrap_err();
    assert!(matches!(err, AuthorizeError::InvariantViolation(_)));
    assert!(spy.calls_for(Action::Admin).is_empty());
}

#[test]
fn test_missing_parent_only_matters_when_its_rung_is_selected() {
    let graph = graph();
    let config = only(Toggle::ItemAdminManagePolicies);
    let spy = Spy::granting_all();
    CascadeResolver::new(&spy, &graph, &config)
        .manage_item_policy(&ctx(), DsoRef::item(10))
        .unwrap();
}

#[test]
fn test_orphan_bitstream_is_invariant_violation() {
    let mut graph = graph();
    graph.add_bitstream(50, "stray.bin", &[]).unwrap();
    let config = AuthorizationConfig::default();
    let spy = Spy::granting_all();
    let err = CascadeResolver::new(&spy, &graph, &config)
        .manage_bitstream_policy(&ctx(), DsoRef::bitstream(50))
        .unwrap_err();
    assert!(matches!(err, AuthorizeError::InvariantViolation(_)));
}

// ============================================================================
// Deviating operations
// ============================================================================

#[test]
fn test_cc_license_direct_add_remove_skips_ladder() {
    let graph = graph();
    let config = AuthorizationConfig::default();
    let spy = Spy::granting(&[(ITEM, Action::Add), (ITEM, Action::Remove)]);
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .manage_cc_license(&ctx(), ITEM)
        .unwrap();
    assert!(spy.calls_for(Action::Admin).is_empty());
    assert_eq!(
        grant.path,
        GrantPath::Direct {
            object: ITEM,
            actions: vec![Action::Add, Action::Remove]
        }
    );
}

#[test_case(Toggle::ItemAdminManageCcLicense, DsoRef::item(3) ; "item admin")]
#[test_case(Toggle::CollectionAdminManageCcLicense, DsoRef::collection(2) ; "collection admin")]
#[test_case(Toggle::CommunityAdminManageCcLicense, DsoRef::collection(2) ; "community toggle uses the owning collection")]
fn test_cc_license_falls_back_to_ladder(toggle: Toggle, expected: DsoRef) {
    let graph = graph();
    let config = only(toggle);
    // ADD alone is not enough for the direct check.
    let spy = Spy::granting(&[(ITEM, Action::Add), (expected, Action::Admin)]);
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .manage_cc_license(&ctx(), ITEM)
        .unwrap();
    assert_eq!(spy.calls_for(Action::Admin), vec![expected]);
    assert_eq!(grant.path, GrantPath::Admin(expected));
}

#[test]
fn test_cc_license_without_toggles_needs_system_admin() {
    let graph = graph();
    let config = AuthorizationConfig::strict();
    let spy = Spy::default();
    let err = CascadeResolver::new(&spy, &graph, &config)
        .manage_cc_license(&ctx(), ITEM)
        .unwrap_err();
    assert_eq!(spy.admin_checks(), 1);
    assert!(matches!(
        err,
        AuthorizeError::Denied {
            operation: Operation::ManageCcLicense,
            ..
        }
    ));
}

#[test_case(DsoRef::collection(2), Action::Write ; "write on collection")]
#[test_case(DsoRef::community(8), Action::Write ; "write on any parent community")]
#[test_case(DsoRef::community(1), Action::Add ; "add on parent community")]
fn test_can_edit_short_circuits_group_management(object: DsoRef, action: Action) {
    let graph = graph();
    let config = AuthorizationConfig::default();
    let spy = Spy::granting(&[(object, action)]);
    let resolver = CascadeResolver::new(&spy, &graph, &config);
    let coll = DsoRef::collection(2);

    for grant in [
        resolver.manage_template_item(&ctx(), coll).unwrap(),
        resolver.manage_submitters_group(&ctx(), coll).unwrap(),
        resolver.manage_workflows_group(&ctx(), coll).unwrap(),
        resolver.manage_collection_admin_group(&ctx(), coll).unwrap(),
    ] {
        assert_eq!(grant.path, GrantPath::CanEdit(coll));
    }
    assert!(spy.calls_for(Action::Admin).is_empty());
}

#[test]
fn test_can_edit_does_not_inherit() {
    let graph = graph();
    let config = only(Toggle::CommunityAdminManageCollectionSubmitters);
    let spy = Spy::granting(&[(DsoRef::community(1), Action::Admin)]);
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .manage_submitters_group(&ctx(), DsoRef::collection(2))
        .unwrap();
    assert_eq!(grant.path, GrantPath::Admin(DsoRef::community(1)));
    let calls = spy.calls.lock().unwrap();
    assert!(
        calls
            .iter()
            .filter(|(_, a, _)| *a != Action::Admin)
            .all(|(_, _, inherit)| !inherit)
    );
}

#[test]
fn test_remove_collection_admin_group_goes_to_parent() {
    let graph = graph();
    let config = only(Toggle::CommunityAdminManageCollectionAdminGroup);
    let spy = Spy::granting_all();
    let resolver = CascadeResolver::new(&spy, &graph, &config);

    resolver
        .remove_collection_admin_group(&ctx(), DsoRef::collection(2))
        .unwrap();
    assert_eq!(spy.calls_for(Action::Admin), vec![DsoRef::community(1)]);

    // Without a parent only a system admin may remove it.
    let err = resolver
        .remove_collection_admin_group(&ctx(), DsoRef::collection(7))
        .unwrap_err();
    assert!(err.is_denial());
    assert_eq!(spy.admin_checks(), 1);
}

#[test]
fn test_collection_admin_cannot_remove_own_admin_group() {
    let graph = graph();
    let config = AuthorizationConfig::default();
    let spy = Spy::granting(&[(DsoRef::collection(2), Action::Admin)]);
    let err = CascadeResolver::new(&spy, &graph, &config)
        .remove_collection_admin_group(&ctx(), DsoRef::collection(2))
        .unwrap_err();
    assert!(matches!(
        err,
        AuthorizeError::Denied {
            operation: Operation::RemoveCollectionAdminGroup,
            ..
        }
    ));
}

#[test]
fn test_remove_community_admin_group() {
    let graph = graph();
    let config = AuthorizationConfig::default();
    let spy = Spy::granting(&[(DsoRef::community(1), Action::Admin)]);
    let resolver = CascadeResolver::new(&spy, &graph, &config);

    let grant = resolver
        .remove_community_admin_group(&ctx(), DsoRef::community(9))
        .unwrap();
    assert_eq!(grant.path, GrantPath::Admin(DsoRef::community(1)));
    assert!(
        resolver
            .remove_community_admin_group(&ctx(), DsoRef::community(1))
            .is_err()
    );
    assert!(
        resolver
            .manage_community_admin_group(&ctx(), DsoRef::community(1))
            .is_ok()
    );
}

#[test]
fn test_withdraw_falls_back_to_remove_on_owning_collection() {
    let graph = graph();
    let config = only(Toggle::CollectionAdminWithdrawItem);
    let spy = Spy::granting(&[(DsoRef::collection(2), Action::Remove)]);
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .withdraw_item(&ctx(), ITEM)
        .unwrap();

    assert_eq!(spy.calls_for(Action::Admin), vec![DsoRef::collection(2)]);
    assert_eq!(
        grant.path,
        GrantPath::Direct {
            object: DsoRef::collection(2),
            actions: vec![Action::Remove]
        }
    );
    let calls = spy.calls.lock().unwrap();
    assert!(calls.contains(&(DsoRef::collection(2), Action::Remove, false)));
}

#[test]
fn test_withdraw_community_admin() {
    let graph = graph();
    let config = only(Toggle::CommunityAdminWithdrawItem);
    let spy = Spy::granting(&[(DsoRef::community(1), Action::Admin)]);
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .withdraw_item(&ctx(), ITEM)
        .unwrap();
    assert_eq!(grant.path, GrantPath::Admin(DsoRef::community(1)));
}

#[test]
fn test_withdraw_without_parent_community_falls_back_to_remove() {
    let graph = graph();
    let config = only(Toggle::CommunityAdminWithdrawItem);
    let unfiled = DsoRef::item(11);
    let spy = Spy::granting(&[(DsoRef::collection(7), Action::Remove)]);
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .withdraw_item(&ctx(), unfiled)
        .unwrap();
    assert!(spy.calls_for(Action::Admin).is_empty());
    assert_eq!(
        grant.path,
        GrantPath::Direct {
            object: DsoRef::collection(7),
            actions: vec![Action::Remove]
        }
    );

    let spy = Spy::default();
    let err = CascadeResolver::new(&spy, &graph, &config)
        .withdraw_item(&ctx(), unfiled)
        .unwrap_err();
    assert!(err.is_denial());
}

#[test]
fn test_withdraw_denied_when_everything_fails() {
    let graph = graph();
    let config = AuthorizationConfig::default();
    let spy = Spy::default();
    let err = CascadeResolver::new(&spy, &graph, &config)
        .withdraw_item(&ctx(), ITEM)
        .unwrap_err();
    assert!(matches!(
        err,
        AuthorizeError::Denied {
            operation: Operation::WithdrawItem,
            ..
        }
    ));
}

#[test]
fn test_reinstate_fails_if_any_collection_fails() {
    let graph = graph();
    let config = only(Toggle::CollectionAdminReinstateItem);
    let spy = Spy::granting(&[(DsoRef::collection(2), Action::Add)]);
    let err = CascadeResolver::new(&spy, &graph, &config)
        .reinstate_item(&ctx(), ITEM)
        .unwrap_err();
    assert!(matches!(
        err,
        AuthorizeError::Denied {
            operation: Operation::ReinstateItem,
            ..
        }
    ));
    assert_eq!(
        spy.calls_for(Action::Add),
        vec![DsoRef::collection(2), DsoRef::collection(6)]
    );
}

#[test]
fn test_reinstate_passes_when_every_collection_passes() {
    let graph = graph();
    let config = only(Toggle::CommunityAdminReinstateItem);
    let spy = Spy::granting(&[
        (DsoRef::community(1), Action::Admin),
        (DsoRef::collection(6), Action::Add),
    ]);
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .reinstate_item(&ctx(), ITEM)
        .unwrap();
    assert_eq!(
        grant.path,
        GrantPath::Each(vec![
            GrantPath::Admin(DsoRef::community(1)),
            GrantPath::Admin(DsoRef::community(1)),
        ])
    );

    let config = AuthorizationConfig::strict();
    let spy = Spy::granting(&[
        (DsoRef::collection(2), Action::Add),
        (DsoRef::collection(6), Action::Add),
    ]);
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .reinstate_item(&ctx(), ITEM)
        .unwrap();
    assert!(matches!(grant.path, GrantPath::Each(paths) if paths.len() == 2));
}

#[test]
fn test_reinstate_without_parent_community_falls_back_to_add() {
    let graph = graph();
    let config = only(Toggle::CommunityAdminReinstateItem);
    let unfiled = DsoRef::item(11);
    let spy = Spy::granting(&[(DsoRef::collection(7), Action::Add)]);
    let grant = CascadeResolver::new(&spy, &graph, &config)
        .reinstate_item(&ctx(), unfiled)
        .unwrap();
    assert!(spy.calls_for(Action::Admin).is_empty());
    assert_eq!(
        grant.path,
        GrantPath::Each(vec![GrantPath::Direct {
            object: DsoRef::collection(7),
            actions: vec![Action::Add]
        }])
    );

    let spy = Spy::default();
    let err = CascadeResolver::new(&spy, &graph, &config)
        .reinstate_item(&ctx(), unfiled)
        .unwrap_err();
    assert!(err.is_denial());
}

// ============================================================================
// Dispatch by resource type
// ============================================================================

#[test]
fn test_manage_policy_dispatches_on_resource_type() {
    let graph = graph();
    let config = only(Toggle::ItemAdminManagePolicies);
    let store = InMemoryPolicyStore::new();
    let on_bitstream = store
        .insert(NewPolicy::new(DsoRef::bitstream(5), Action::Read, GroupId::ANONYMOUS))
        .unwrap();
    let on_group = store
        .insert(NewPolicy::new(
            DsoRef::new(ResourceType::Group, 12u64),
            Action::Admin,
            GroupId::new(12),
        ))
        .unwrap();
    let on_ghost = store
        .insert(NewPolicy::new(DsoRef::item(999), Action::Read, GroupId::ANONYMOUS))
        .unwrap();

    let spy = Spy::granting_all();
    let resolver = CascadeResolver::new(&spy, &graph, &config);
    let grant = resolver.manage_policy(&ctx(), &on_bitstream).unwrap();
    assert_eq!(grant.operation, Operation::ManagePolicy);
    assert_eq!(spy.calls_for(Action::Admin), vec![ITEM]);

    assert!(resolver.manage_policy(&ctx(), &on_group).unwrap_err().is_denial());
    assert_eq!(spy.admin_checks(), 1);

    assert!(matches!(
        resolver.manage_policy(&ctx(), &on_ghost),
        Err(AuthorizeError::InvariantViolation(_))
    ));
}

#[test]
fn test_require_admin_role() {
    let graph = graph();
    let config = AuthorizationConfig::default();
    let resolver_spy = Spy::system_admin();
    let grant = CascadeResolver::new(&resolver_spy, &graph, &config)
        .require_admin_role(&ctx())
        .unwrap();
    assert_eq!(grant.operation, Operation::RequireAdminRole);
}

// ============================================================================
// Against the real evaluator
// ============================================================================

#[test]
fn test_community_admin_manages_item_policies_end_to_end() {
    let graph = graph();
    let store = InMemoryPolicyStore::new();
    let admins = GroupId::new(20);
    let mut groups = GroupRegistry::new();
    groups.add_group(admins, "Sciences admins");
    groups.add_member(admins, EPersonId::new(42));
    store
        .insert(NewPolicy::new(DsoRef::community(1), Action::Admin, admins))
        .unwrap();

    let evaluator = PolicyEvaluator::new(&store, &graph, &groups);
    let config = only(Toggle::CommunityAdminManageItemPolicies);
    let resolver = CascadeResolver::new(&evaluator, &graph, &config);

    assert!(resolver.manage_item_policy(&ctx(), ITEM).is_ok());
    assert!(
        resolver
            .manage_item_policy(&Context::for_user(EPersonId::new(43)), ITEM)
            .unwrap_err()
            .is_denial()
    );
}
