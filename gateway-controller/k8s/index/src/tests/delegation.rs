use super::*;
use linkerd_gateway_controller_core::{
    routes::{ALL_NAMESPACES, DELEGATION_LABEL},
    RouteErrorReason, RouteLookup,
};
use maplit::btreemap;
use pretty_assertions::assert_eq;

/// Resolves the delegation tree of `root` against `routes`, as if `root`
/// were bound to a Gateway listener.
fn resolve_tree(root: &str, routes: Vec<HttpRoute>, max_depth: usize) -> RouteInfo {
    init_tracing();
    let snapshot = mk_snapshot(vec![], routes.into_iter().map(http).collect());
    let (ns, name) = root.split_once('/').expect("root must be namespace/name");
    let route = snapshot
        .fetch_by_name(ns, name)
        .expect("root route must exist");
    DelegationResolver::new(&snapshot, max_depth).resolve(route, gateway_ref("gw"), Some(vec![]))
}

fn delegating(
    ns: &str,
    name: &str,
    parent_refs: Vec<ParentReference>,
    delegates: Vec<DelegateRef>,
) -> HttpRoute {
    mk_route(
        ns,
        name,
        parent_refs,
        vec![mk_rule(
            vec![HttpRouteMatch::prefix("/")],
            delegates.into_iter().map(delegate).collect(),
        )],
    )
}

fn leaf(ns: &str, name: &str, parent_refs: Vec<ParentReference>) -> HttpRoute {
    mk_route(
        ns,
        name,
        parent_refs,
        vec![mk_rule(vec![HttpRouteMatch::prefix("/")], vec![backend(ns, name)])],
    )
}

fn child_names(info: &RouteInfo, delegate: &DelegateRef) -> Vec<String> {
    info.children
        .get(delegate)
        .expect("delegate slot must exist")
        .values
        .iter()
        .map(|child| child.route.name().to_string())
        .collect()
}

fn slot_error(info: &RouteInfo, delegate: &DelegateRef) -> Option<RouteErrorReason> {
    info.children
        .get(delegate)
        .expect("delegate slot must exist")
        .error
        .clone()
}

#[test]
fn wildcard_delegation_skips_self() {
    let wildcard = DelegateRef::wildcard("default");
    let tree = resolve_tree(
        "default/parent",
        vec![
            delegating("default", "parent", vec![gateway_ref("gw")], vec![wildcard.clone()]),
            leaf("default", "child1", vec![]),
            leaf(
                "default",
                "child2",
                vec![ParentReference::http_route("default", "parent")],
            ),
            leaf(
                "default",
                "not-mine",
                vec![ParentReference::http_route("default", "other")],
            ),
        ],
        DEFAULT_MAX_DELEGATION_DEPTH,
    );

    assert_eq!(child_names(&tree, &wildcard), vec!["child1", "child2"]);
    assert_eq!(
        slot_error(&tree, &wildcard),
        Some(RouteErrorReason::CyclicReference)
    );
}

#[test]
fn children_report_against_their_delegating_route() {
    let child = DelegateRef::route("default", "child");
    let tree = resolve_tree(
        "default/parent",
        vec![
            delegating("default", "parent", vec![gateway_ref("gw")], vec![child.clone()]),
            leaf("default", "child", vec![]),
        ],
        DEFAULT_MAX_DELEGATION_DEPTH,
    );

    let resolved = &tree.children.get(&child).unwrap().values[0];
    assert_eq!(
        resolved.parent_ref,
        ParentReference::http_route("default", "parent")
    );
    assert_eq!(resolved.hostname_overrides, tree.hostname_overrides);
}

#[test]
fn diamonds_resolve_along_both_paths() {
    let (b1, b2, c) = (
        DelegateRef::route("ns", "b1"),
        DelegateRef::route("ns", "b2"),
        DelegateRef::route("ns", "c"),
    );
    let tree = resolve_tree(
        "ns/a",
        vec![
            delegating("ns", "a", vec![gateway_ref("gw")], vec![b1.clone(), b2.clone()]),
            delegating("ns", "b1", vec![], vec![c.clone()]),
            delegating("ns", "b2", vec![], vec![c.clone()]),
            leaf("ns", "c", vec![]),
        ],
        DEFAULT_MAX_DELEGATION_DEPTH,
    );

    for b in [&b1, &b2] {
        assert_eq!(slot_error(&tree, b), None);
        let resolved = &tree.children.get(b).unwrap().values[0];
        assert_eq!(child_names(resolved, &c), vec!["c"]);
        assert_eq!(slot_error(resolved, &c), None);
    }
}

#[test]
fn cycles_terminate() {
    let (to_a, to_b) = (DelegateRef::route("ns", "a"), DelegateRef::route("ns", "b"));
    let tree = resolve_tree(
        "ns/a",
        vec![
            delegating("ns", "a", vec![gateway_ref("gw")], vec![to_b.clone()]),
            delegating("ns", "b", vec![], vec![to_a.clone()]),
        ],
        DEFAULT_MAX_DELEGATION_DEPTH,
    );

    assert_eq!(child_names(&tree, &to_b), vec!["b"]);
    assert_eq!(slot_error(&tree, &to_b), None);

    let b = &tree.children.get(&to_b).unwrap().values[0];
    assert!(child_names(b, &to_a).is_empty());
    assert_eq!(slot_error(b, &to_a), Some(RouteErrorReason::CyclicReference));
}

#[test]
fn bad_references_do_not_fail_siblings() {
    let missing = DelegateRef::route("ns", "missing");
    let mut kindless = DelegateRef::route("ns", "kindless");
    kindless.0.kind = "".into();
    let good = DelegateRef::route("ns", "good");

    let tree = resolve_tree(
        "ns/parent",
        vec![
            delegating(
                "ns",
                "parent",
                vec![gateway_ref("gw")],
                vec![missing.clone(), kindless.clone(), good.clone()],
            ),
            leaf("ns", "good", vec![]),
        ],
        DEFAULT_MAX_DELEGATION_DEPTH,
    );

    assert_eq!(
        slot_error(&tree, &missing),
        Some(RouteErrorReason::UnresolvedReference)
    );
    assert_eq!(
        slot_error(&tree, &kindless),
        Some(RouteErrorReason::LocalObjRefMissingKind)
    );
    assert_eq!(child_names(&tree, &good), vec!["good"]);
    assert_eq!(slot_error(&tree, &good), None);
}

#[test]
fn children_must_opt_in_to_the_parent() {
    let child = DelegateRef::route("ns", "child");
    let tree = resolve_tree(
        "ns/parent",
        vec![
            delegating("ns", "parent", vec![gateway_ref("gw")], vec![child.clone()]),
            leaf("ns", "child", vec![ParentReference::http_route("ns", "someone-else")]),
        ],
        DEFAULT_MAX_DELEGATION_DEPTH,
    );

    assert!(child_names(&tree, &child).is_empty());
    assert_eq!(slot_error(&tree, &child), None);
}

#[test]
fn cross_namespace_children_name_their_parent() {
    let child = DelegateRef::route("team", "child");
    let tree = resolve_tree(
        "infra/parent",
        vec![
            delegating("infra", "parent", vec![gateway_ref("gw")], vec![child.clone()]),
            leaf(
                "team",
                "child",
                vec![ParentReference::http_route("infra", "parent")],
            ),
        ],
        DEFAULT_MAX_DELEGATION_DEPTH,
    );
    assert_eq!(child_names(&tree, &child), vec!["child"]);
}

#[test]
fn label_selectors_search_namespaces() {
    let labeled = |ns: &str, name: &str, label: &str| HttpRoute {
        meta: RouteMeta {
            labels: Labels::from(btreemap! { DELEGATION_LABEL.to_string() => label.to_string() }),
            ..RouteMeta::new(ns, name)
        },
        ..leaf(ns, name, vec![])
    };

    let in_namespace = DelegateRef::label("team-a", "web");
    let everywhere = DelegateRef::label(ALL_NAMESPACES, "web");
    let nothing = DelegateRef::label(ALL_NAMESPACES, "unused");

    let tree = resolve_tree(
        "infra/parent",
        vec![
            delegating(
                "infra",
                "parent",
                vec![gateway_ref("gw")],
                vec![in_namespace.clone(), everywhere.clone(), nothing.clone()],
            ),
            labeled("team-a", "one", "web"),
            labeled("team-b", "two", "web"),
            labeled("team-b", "three", "api"),
        ],
        DEFAULT_MAX_DELEGATION_DEPTH,
    );

    assert_eq!(child_names(&tree, &in_namespace), vec!["one"]);
    assert_eq!(child_names(&tree, &everywhere), vec!["one", "two"]);
    assert_eq!(
        slot_error(&tree, &nothing),
        Some(RouteErrorReason::UnresolvedReference)
    );
}

#[test]
fn depth_is_bounded() {
    let (to_b, to_c) = (DelegateRef::route("ns", "b"), DelegateRef::route("ns", "c"));
    let tree = resolve_tree(
        "ns/a",
        vec![
            delegating("ns", "a", vec![gateway_ref("gw")], vec![to_b.clone()]),
            delegating("ns", "b", vec![], vec![to_c.clone()]),
            leaf("ns", "c", vec![]),
        ],
        1,
    );

    assert_eq!(child_names(&tree, &to_b), vec!["b"]);
    let b = &tree.children.get(&to_b).unwrap().values[0];
    assert!(child_names(b, &to_c).is_empty());
    assert_eq!(
        slot_error(b, &to_c),
        Some(RouteErrorReason::DelegationDepthExceeded(1))
    );
}

#[test]
fn tree_size_is_bounded() {
    init_tracing();
    let mesh = DelegateRef::wildcard("mesh");
    let mut routes = vec![delegating(
        "ns",
        "root",
        vec![gateway_ref("gw")],
        vec![mesh.clone()],
    )];
    // Every mesh route delegates to every other, so the tree would hold
    // one node per simple path through the namespace.
    for i in 0..4 {
        routes.push(delegating("mesh", &format!("m{i}"), vec![], vec![mesh.clone()]));
    }
    let snapshot = mk_snapshot(vec![], routes.into_iter().map(http).collect());
    let root = snapshot.fetch_by_name("ns", "root").unwrap();

    let tree = DelegationResolver::new(&snapshot, DEFAULT_MAX_DELEGATION_DEPTH)
        .with_max_nodes(2)
        .resolve(root.clone(), gateway_ref("gw"), Some(vec![]));

    fn count(info: &RouteInfo, delegate: &DelegateRef) -> usize {
        info.children
            .get(delegate)
            .map(|slot| slot.values.iter().map(|c| 1 + count(c, delegate)).sum())
            .unwrap_or(0)
    }
    assert_eq!(count(&tree, &mesh), 2);
    assert_eq!(child_names(&tree, &mesh).len(), 1);
    assert_eq!(
        slot_error(&tree, &mesh),
        Some(RouteErrorReason::DelegationTreeTooLarge(2))
    );

    let unbounded = DelegationResolver::new(&snapshot, DEFAULT_MAX_DELEGATION_DEPTH)
        .resolve(root, gateway_ref("gw"), Some(vec![]));
    // 4 + 4*3 + 4*3*2 + 4*3*2*1 simple paths.
    assert_eq!(count(&unbounded, &mesh), 64);
    assert_eq!(slot_error(&unbounded, &mesh), None);
}
