use crate::delegation::DelegationResolver;
use linkerd_gateway_controller_core::{
    attach::{
        is_kind_allowed, is_namespace_allowed, parent_ref_matches_listener,
        route_can_attach_to_listener_parent, validate_allowed_namespaces,
    },
    gateway::{Gateway, ListenerParent, ListenerSet},
    hostname,
    routes::{
        GroupKindNamespaceName, ParentReference, Route, GATEWAY_API_GROUP, GATEWAY_KIND,
        LISTENER_SET_KIND,
    },
    ListenerError, NamespaceLookup, RouteError, RouteErrorReason, RouteInfo, RouteLookup,
};

/// The routes bound to one listener, or the configuration error that
/// disabled it.
#[derive(Clone, Debug, PartialEq)]
pub struct ListenerResult {
    /// The Gateway or ListenerSet that declares the listener.
    pub parent: GroupKindNamespaceName,
    pub listener: String,
    pub result: Result<Vec<RouteInfo>, ListenerError>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    pub listeners: Vec<ListenerResult>,

    /// One entry per parent reference that bound to no listener.
    pub route_errors: Vec<RouteError>,
}

/// Binds routes to the listeners of the Gateways and ListenerSets they
/// reference.
#[derive(Debug)]
pub struct ListenerBinder<'a, L> {
    lookup: &'a L,
    resolver: DelegationResolver<'a, L>,
}

/// Why a parent reference failed to bind, from least to most specific.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
enum Progress {
    #[default]
    NoListener,
    NotAllowed,
    NoHostname,
}

// === impl ListenerBinder ===

impl<'a, L: RouteLookup + NamespaceLookup> ListenerBinder<'a, L> {
    pub fn new(lookup: &'a L, max_delegation_depth: usize) -> Self {
        Self {
            lookup,
            resolver: DelegationResolver::new(lookup, max_delegation_depth),
        }
    }

    pub fn with_max_delegation_nodes(mut self, max_nodes: usize) -> Self {
        self.resolver = self.resolver.with_max_nodes(max_nodes);
        self
    }

    /// Binds `routes`, which must be in precedence order, to the listeners
    /// of `gateways` and of the admitted `listener_sets`.
    pub fn bind(
        &self,
        gateways: &[Gateway],
        listener_sets: &[ListenerSet],
        routes: &[Route],
    ) -> Bindings {
        let parents = listener_parents(gateways, listener_sets);

        let mut listeners = parents
            .iter()
            .flat_map(|parent| {
                let id = parent.gknn();
                parent.listeners().iter().map(move |listener| ListenerResult {
                    parent: id.clone(),
                    listener: listener.name.clone(),
                    result: validate_allowed_namespaces(listener).map(|()| vec![]),
                })
            })
            .collect::<Vec<_>>();
        for ListenerResult {
            parent,
            listener,
            result,
        } in &listeners
        {
            if let Err(error) = result {
                tracing::warn!(%parent, %listener, %error, "Listener is misconfigured");
            }
        }

        let mut route_errors = Vec::new();
        for route in routes {
            for parent_ref in route.parent_refs() {
                if !targets_listener_parent(parent_ref) {
                    continue;
                }
                let known = parents.iter().any(|parent| {
                    route_can_attach_to_listener_parent(parent_ref, route.namespace(), *parent)
                });
                if !known {
                    // The parent is missing or belongs to another controller.
                    tracing::debug!(
                        route = %route.gknn(),
                        parent = %parent_ref.name,
                        "Unknown parent"
                    );
                    continue;
                }
                let bound = self.bind_parent_ref(route, parent_ref, &parents, &mut listeners);
                if let Err(reason) = bound {
                    tracing::debug!(
                        route = %route.gknn(),
                        parent = %parent_ref.name,
                        %reason,
                        "Route did not bind"
                    );
                    route_errors.push(RouteError {
                        route: route.gknn(),
                        parent_ref: parent_ref.clone(),
                        reason,
                    });
                }
            }
        }

        Bindings {
            listeners,
            route_errors,
        }
    }

    /// Binds `route` to every listener `parent_ref` selects. Every listener
    /// that accepts the route binds it.
    fn bind_parent_ref(
        &self,
        route: &Route,
        parent_ref: &ParentReference,
        parents: &[ListenerParent<'_>],
        listeners: &mut [ListenerResult],
    ) -> Result<(), RouteErrorReason> {
        let mut progress = Progress::default();
        let mut bound = false;
        let mut slot = 0;

        for parent in parents {
            let selected =
                route_can_attach_to_listener_parent(parent_ref, route.namespace(), *parent);
            for listener in parent.listeners() {
                let idx = slot;
                slot += 1;
                if !selected {
                    continue;
                }

                if !parent_ref_matches_listener(parent_ref, listener) {
                    continue;
                }
                progress = progress.max(Progress::NotAllowed);

                let Ok(routes) = listeners[idx].result.as_mut() else {
                    continue;
                };
                if !is_kind_allowed(listener, route.group(), route.kind()) {
                    continue;
                }
                let allowed = is_namespace_allowed(
                    listener,
                    parent.namespace(),
                    route.namespace(),
                    self.lookup,
                );
                if !matches!(allowed, Ok(true)) {
                    continue;
                }
                progress = progress.max(Progress::NoHostname);

                let hostnames =
                    hostname::intersect(listener.hostname.as_deref(), route.hostnames());
                let Some(hostnames) = hostnames else {
                    continue;
                };

                tracing::debug!(
                    route = %route.gknn(),
                    parent = %parent.gknn(),
                    listener = %listener.name,
                    "Route bound"
                );
                routes.push(self.route_info(route, parent_ref, hostnames));
                bound = true;
            }
        }

        if bound {
            return Ok(());
        }
        Err(match progress {
            Progress::NoListener => RouteErrorReason::NoMatchingParent,
            Progress::NotAllowed => RouteErrorReason::NotAllowedByListeners,
            Progress::NoHostname => RouteErrorReason::NoMatchingListenerHostname,
        })
    }

    fn route_info(
        &self,
        route: &Route,
        parent_ref: &ParentReference,
        hostnames: Vec<String>,
    ) -> RouteInfo {
        match route {
            Route::Http(http) => self
                .resolver
                .resolve(http.clone(), parent_ref.clone(), Some(hostnames)),
            route => RouteInfo {
                hostname_overrides: Some(hostnames),
                ..RouteInfo::new(route.clone(), parent_ref.clone())
            },
        }
    }
}

/// Gateways, followed by the ListenerSets their Gateway admits.
fn listener_parents<'p>(
    gateways: &'p [Gateway],
    listener_sets: &'p [ListenerSet],
) -> Vec<ListenerParent<'p>> {
    let mut parents = gateways
        .iter()
        .map(ListenerParent::Gateway)
        .collect::<Vec<_>>();

    for set in listener_sets {
        let admitted = gateways.iter().any(|gateway| gateway.admits(set));
        if !admitted {
            tracing::warn!(
                namespace = %set.namespace,
                name = %set.name,
                gateway = %set.gateway,
                "ListenerSet is not permitted by its Gateway"
            );
            continue;
        }
        parents.push(ListenerParent::ListenerSet(set));
    }

    parents
}

/// Only references to Gateways and ListenerSets bind to listeners; references
/// to HTTPRoutes are delegation opt-ins.
fn targets_listener_parent(parent_ref: &ParentReference) -> bool {
    parent_ref.group == GATEWAY_API_GROUP
        && (parent_ref.kind == GATEWAY_KIND || parent_ref.kind == LISTENER_SET_KIND)
}
