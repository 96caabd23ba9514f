use super::*;
use linkerd_gateway_controller_core::{
    http_route::{HeaderMatch, HeaderName, HeaderValue, PathMatch},
    routes::GroupKindNamespaceName,
    status::{ConditionReason, ConditionType, RouteCondition},
    RouteErrorReason, RouteLookup,
};
use pretty_assertions::assert_eq;

fn flatten_tree(root: &str, routes: Vec<HttpRoute>) -> Flattened {
    init_tracing();
    let snapshot = mk_snapshot(vec![], routes.into_iter().map(http).collect());
    let (ns, name) = root.split_once('/').expect("root must be namespace/name");
    let route = snapshot
        .fetch_by_name(ns, name)
        .expect("root route must exist");
    let tree = DelegationResolver::new(&snapshot, DEFAULT_MAX_DELEGATION_DEPTH).resolve(
        route,
        gateway_ref("gw"),
        Some(vec!["example.com".to_string()]),
    );
    TreeFlattener::flatten(&tree)
}

fn parent(ns: &str, name: &str, prefix: &str, backends: Vec<BackendOrDelegate>) -> HttpRoute {
    mk_route(
        ns,
        name,
        vec![gateway_ref("gw")],
        vec![mk_rule(vec![HttpRouteMatch::prefix(prefix)], backends)],
    )
}

fn child(ns: &str, name: &str, matches: Vec<HttpRouteMatch>) -> HttpRoute {
    mk_route(ns, name, vec![], vec![mk_rule(matches, vec![backend(ns, name)])])
}

fn header(name: &'static str, value: &'static str) -> HeaderMatch {
    HeaderMatch::Exact(HeaderName::from_static(name), HeaderValue::from_static(value))
}

fn conditions_for<'c>(flat: &'c Flattened, name: &str) -> Vec<&'c RouteCondition> {
    flat.conditions
        .iter()
        .filter(|c| c.route.name == name)
        .collect()
}

#[test]
fn strict_children_must_narrow_the_parent_match() {
    let flat = flatten_tree(
        "ns/parent",
        vec![
            parent("ns", "parent", "/foo", vec![delegate(DelegateRef::route("ns", "child"))]),
            mk_route(
                "ns",
                "child",
                vec![],
                vec![
                    mk_rule(vec![HttpRouteMatch::prefix("/foo/bar")], vec![backend("ns", "bar")]),
                    mk_rule(vec![HttpRouteMatch::prefix("/bar/baz")], vec![backend("ns", "baz")]),
                ],
            ),
        ],
    );

    assert_eq!(
        flat_names(&flat.routes),
        vec!["httproute-ns-parent-0-0.httproute-ns-child-0-0"]
    );
    let entry = &flat.routes[0];
    assert_eq!(entry.route_match, HttpRouteMatch::prefix("/foo/bar"));
    assert_eq!(entry.backends, vec![mk_backend("ns", "bar")]);
    assert_eq!(entry.hostnames, vec!["example.com".to_string()]);
    assert_eq!(entry.source, GroupKindNamespaceName::http_route("ns", "child"));

    assert_eq!(
        conditions_for(&flat, "child"),
        vec![&RouteCondition::accepted(
            GroupKindNamespaceName::http_route("ns", "child"),
            ParentReference::http_route("ns", "parent"),
        )]
    );
}

#[test]
fn children_without_matching_rules_are_not_accepted() {
    let flat = flatten_tree(
        "ns/parent",
        vec![
            parent("ns", "parent", "/foo", vec![delegate(DelegateRef::route("ns", "child"))]),
            child("ns", "child", vec![HttpRouteMatch::prefix("/bar")]),
        ],
    );

    assert!(flat.routes.is_empty());
    assert!(conditions_for(&flat, "child").is_empty());
}

#[test]
fn inheriting_children_extend_the_parent_match() {
    let mut inheriting = child(
        "ns",
        "child",
        vec![HttpRouteMatch {
            path: Some(PathMatch::Prefix("/baz".to_string())),
            headers: vec![header("x", "2")],
            ..Default::default()
        }],
    );
    inheriting.inherit_parent_matcher = true;

    let mut root = parent("ns", "parent", "/foo", vec![delegate(DelegateRef::route("ns", "child"))]);
    root.rules[0].matches[0].headers = vec![header("x", "1")];

    let flat = flatten_tree("ns/parent", vec![root, inheriting]);

    assert_eq!(flat.routes.len(), 1);
    assert_eq!(
        flat.routes[0].route_match,
        HttpRouteMatch {
            path: Some(PathMatch::Prefix("/foo/baz".to_string())),
            headers: vec![header("x", "1")],
            ..Default::default()
        }
    );
}

#[test]
fn inheriting_rules_without_matches_take_the_parent_match() {
    let mut inheriting = child("ns", "child", vec![]);
    inheriting.inherit_parent_matcher = true;

    let flat = flatten_tree(
        "ns/parent",
        vec![
            parent("ns", "parent", "/foo", vec![delegate(DelegateRef::route("ns", "child"))]),
            inheriting,
        ],
    );

    assert_eq!(flat.routes.len(), 1);
    assert_eq!(flat.routes[0].route_match, HttpRouteMatch::prefix("/foo"));
}

#[test]
fn children_must_not_declare_hostnames() {
    let mut named = child("ns", "child", vec![HttpRouteMatch::prefix("/foo/bar")]);
    named.hostnames = vec!["other.example.com".to_string()];

    let flat = flatten_tree(
        "ns/parent",
        vec![
            parent("ns", "parent", "/foo", vec![delegate(DelegateRef::route("ns", "child"))]),
            named,
        ],
    );

    assert!(flat.routes.is_empty());
    let conditions = conditions_for(&flat, "child");
    assert_eq!(conditions.len(), 1);
    assert_eq!(conditions[0].type_, ConditionType::Accepted);
    assert!(!conditions[0].status);
    assert_eq!(conditions[0].reason, ConditionReason::UnsupportedValue);
}

#[test]
fn concrete_backends_precede_delegated_children() {
    let flat = flatten_tree(
        "ns/parent",
        vec![
            parent(
                "ns",
                "parent",
                "/",
                vec![
                    delegate(DelegateRef::route("ns", "child")),
                    backend("ns", "fallback"),
                ],
            ),
            child("ns", "child", vec![HttpRouteMatch::prefix("/child")]),
        ],
    );

    assert_eq!(
        flat_names(&flat.routes),
        vec![
            "httproute-ns-parent-0-0",
            "httproute-ns-parent-0-0.httproute-ns-child-0-0",
        ]
    );
    assert_eq!(flat.routes[0].backends, vec![mk_backend("ns", "fallback")]);
}

#[test]
fn failed_slots_report_on_the_delegating_route() {
    let flat = flatten_tree(
        "ns/parent",
        vec![
            parent("ns", "parent", "/", vec![delegate(DelegateRef::wildcard("ns"))]),
            child("ns", "child", vec![HttpRouteMatch::prefix("/child")]),
        ],
    );

    assert_eq!(
        flat_names(&flat.routes),
        vec!["httproute-ns-parent-0-0.httproute-ns-child-0-0"]
    );
    assert_eq!(
        conditions_for(&flat, "parent"),
        vec![&RouteCondition::from_error(
            GroupKindNamespaceName::http_route("ns", "parent"),
            gateway_ref("gw"),
            &RouteErrorReason::CyclicReference,
        )]
    );
    assert_eq!(
        conditions_for(&flat, "parent")[0].reason,
        ConditionReason::RefNotPermitted
    );
}

#[test]
fn diamond_entries_have_distinct_names() {
    let via = |name: &str, target: &str| {
        mk_route(
            "ns",
            name,
            vec![],
            vec![mk_rule(vec![], vec![delegate(DelegateRef::route("ns", target))])],
        )
    };
    let flat = flatten_tree(
        "ns/a",
        vec![
            mk_route(
                "ns",
                "a",
                vec![gateway_ref("gw")],
                vec![mk_rule(
                    vec![],
                    vec![
                        delegate(DelegateRef::route("ns", "b1")),
                        delegate(DelegateRef::route("ns", "b2")),
                    ],
                )],
            ),
            via("b1", "c"),
            via("b2", "c"),
            child("ns", "c", vec![]),
        ],
    );

    assert_eq!(
        flat_names(&flat.routes),
        vec![
            "httproute-ns-a-0-0.httproute-ns-b1-0-0.httproute-ns-c-0-0",
            "httproute-ns-a-0-0.httproute-ns-b2-0-0.httproute-ns-c-0-0",
        ]
    );
}

#[test]
fn rules_without_matches_match_everything() {
    let mut route = mk_route(
        "ns",
        "web",
        vec![gateway_ref("gw")],
        vec![mk_rule(vec![], vec![backend("ns", "web")])],
    );
    route.rules[0].name = Some("default".to_string());

    let flat = flatten_tree("ns/web", vec![route]);

    assert_eq!(flat_names(&flat.routes), vec!["httproute-ns-web-0-0-default"]);
    assert_eq!(flat.routes[0].route_match, HttpRouteMatch::prefix("/"));
    assert_eq!(flat.routes[0].rule_name.as_deref(), Some("default"));
    assert!(flat.conditions.is_empty());
}

#[test]
fn children_reached_twice_by_one_rule_are_emitted_once() {
    let flat = flatten_tree(
        "ns/p",
        vec![
            parent(
                "ns",
                "p",
                "/",
                vec![
                    delegate(DelegateRef::route("ns", "c")),
                    delegate(DelegateRef::wildcard("ns")),
                ],
            ),
            child("ns", "c", vec![HttpRouteMatch::prefix("/c")]),
        ],
    );

    assert_eq!(
        flat_names(&flat.routes),
        vec!["httproute-ns-p-0-0.httproute-ns-c-0-0"]
    );
    assert_eq!(
        conditions_for(&flat, "c"),
        vec![&RouteCondition::accepted(
            GroupKindNamespaceName::http_route("ns", "c"),
            ParentReference::http_route("ns", "p"),
        )]
    );
}

#[test]
fn cyclic_trees_are_cut_while_flattening() {
    init_tracing();
    let (to_a, to_b) = (DelegateRef::route("ns", "a"), DelegateRef::route("ns", "b"));
    let a = Arc::new(parent("ns", "a", "/", vec![delegate(to_b.clone())]));
    let b = Arc::new(mk_route(
        "ns",
        "b",
        vec![],
        vec![mk_rule(vec![], vec![delegate(to_a.clone())])],
    ));

    // a -> b -> a, built by hand since the resolver never yields a cycle.
    let mut inner_a = RouteInfo::new(Route::Http(a.clone()), ParentReference::http_route("ns", "b"));
    inner_a.hostname_overrides = Some(vec!["example.com".to_string()]);
    let mut b_info = RouteInfo::new(Route::Http(b), ParentReference::http_route("ns", "a"));
    b_info.hostname_overrides = Some(vec!["example.com".to_string()]);
    b_info.children.push(to_a, inner_a);
    let mut root = RouteInfo::new(Route::Http(a), gateway_ref("gw"));
    root.hostname_overrides = Some(vec!["example.com".to_string()]);
    root.children.push(to_b, b_info);

    let flat = TreeFlattener::flatten(&root);

    assert!(flat.routes.is_empty());
    assert!(conditions_for(&flat, "b").is_empty());
    assert_eq!(
        conditions_for(&flat, "a"),
        vec![&RouteCondition::from_error(
            GroupKindNamespaceName::http_route("ns", "a"),
            ParentReference::http_route("ns", "b"),
            &RouteErrorReason::CyclicReference,
        )]
    );
}
