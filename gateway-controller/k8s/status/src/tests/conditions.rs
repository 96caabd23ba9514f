use super::*;
use linkerd_gateway_controller_k8s_index::Resolution;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::num::NonZeroU16;

fn index_of(conditions: Vec<RouteCondition>) -> Index {
    let mut index = Index::new(GATEWAY_CONTROLLER_NAME);
    index.extend(conditions);
    index
}

#[test]
fn accepted_routes_resolve_refs_by_default() {
    let index = index_of(vec![accepted("web")]);

    assert_eq!(
        index.statuses_at(timestamp()),
        vec![Update {
            id: route_id("web"),
            status: RouteStatus {
                parents: vec![gateway_parent_status(vec![
                    make_condition("Accepted", "True", "Accepted", ""),
                    resolved_refs(),
                ])],
            },
        }]
    );
}

#[rstest]
#[case(false)]
#[case(true)]
fn false_outcomes_take_precedence(#[case] failure_first: bool) {
    let mut conditions = vec![
        accepted("web"),
        failed("web", RouteErrorReason::NotAllowedByListeners),
    ];
    if failure_first {
        conditions.reverse();
    }
    let index = index_of(conditions);

    let statuses = index.statuses_at(timestamp());
    assert_eq!(
        statuses[0].status.parents[0].conditions[0],
        make_condition(
            "Accepted",
            "False",
            "NotAllowedByListeners",
            &RouteErrorReason::NotAllowedByListeners.to_string(),
        )
    );
}

#[test]
fn first_failure_is_kept() {
    let index = index_of(vec![
        failed("web", RouteErrorReason::UnresolvedReference),
        failed("web", RouteErrorReason::CyclicReference),
    ]);

    let statuses = index.statuses_at(timestamp());
    assert_eq!(
        statuses[0].status.parents[0].conditions,
        vec![make_condition(
            "ResolvedRefs",
            "False",
            "BackendNotFound",
            &RouteErrorReason::UnresolvedReference.to_string(),
        )]
    );
}

#[test]
fn parents_are_reported_separately() {
    let child = GroupKindNamespaceName::http_route("team", "child");
    let via_http = ParentReference::http_route("ns", "parent");
    let via_gateway = ParentReference::gateway("gw")
        .with_namespace("ns")
        .with_section_name("http")
        .with_port(NonZeroU16::new(8080).unwrap());

    let index = index_of(vec![
        RouteCondition::accepted(child.clone(), via_http),
        RouteCondition::from_error(
            child.clone(),
            via_gateway,
            &RouteErrorReason::NoMatchingParent,
        ),
    ]);

    let statuses = index.statuses_at(timestamp());
    assert_eq!(statuses.len(), 1);
    let refs = statuses[0]
        .status
        .parents
        .iter()
        .map(|p| p.parent_ref.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        refs,
        vec![
            k8s::ParentReference {
                group: Some("gateway.networking.k8s.io".to_string()),
                kind: Some("Gateway".to_string()),
                namespace: Some("ns".to_string()),
                name: "gw".to_string(),
                section_name: Some("http".to_string()),
                port: Some(8080),
            },
            k8s::ParentReference {
                group: Some("gateway.networking.k8s.io".to_string()),
                kind: Some("HTTPRoute".to_string()),
                namespace: Some("ns".to_string()),
                name: "parent".to_string(),
                section_name: None,
                port: None,
            },
        ]
    );
}

#[test]
fn indexes_resolution_conditions() {
    let resolution = Resolution {
        conditions: vec![
            accepted("b"),
            accepted("a"),
            failed("a", RouteErrorReason::DelegationDepthExceeded(3)),
        ],
        ..Default::default()
    };

    let mut index = Index::new(GATEWAY_CONTROLLER_NAME);
    assert!(index.is_empty());
    index.apply_resolution(&resolution);

    let statuses = index.statuses_at(timestamp());
    assert_eq!(
        statuses.iter().map(|u| u.id.clone()).collect::<Vec<_>>(),
        vec![route_id("a"), route_id("b")]
    );
    assert_eq!(
        statuses[0].status.parents[0].conditions[1],
        make_condition(
            "ResolvedRefs",
            "False",
            "RefNotPermitted",
            "delegation exceeds the maximum depth of 3",
        )
    );
}
