//! Predicates deciding whether a route may attach to a parent.
//!
//! These are pure functions over already-converted resources; the listener
//! binder and the delegation resolver drive them.

use crate::{
    gateway::{AllowedNamespaces, Listener, ListenerParent, Protocol, RouteGroupKind},
    lookup::NamespaceLookup,
    routes::{
        GroupKindNamespaceName, ParentReference, GATEWAY_API_GROUP, GRPC_ROUTE_KIND,
        HTTP_ROUTE_KIND, TCP_ROUTE_KIND, TLS_ROUTE_KIND,
    },
    ListenerError,
};

/// Returns true if a delegated child may attach to `parent`.
///
/// A child without parent references opts in to every parent. Otherwise one
/// of its references must name the parent HTTPRoute; omitted namespaces
/// default to the child's own.
pub fn child_can_attach(
    child_namespace: &str,
    child_parent_refs: &[ParentReference],
    parent: &GroupKindNamespaceName,
) -> bool {
    if child_parent_refs.is_empty() {
        return true;
    }

    child_parent_refs.iter().any(|parent_ref| {
        parent_ref.group == GATEWAY_API_GROUP
            && parent_ref.kind == HTTP_ROUTE_KIND
            && parent_ref.name == parent.name
            && parent_ref.namespace_or(child_namespace) == parent.namespace
    })
}

/// Returns true if `parent_ref`, declared by a route in `route_namespace`,
/// selects `parent`.
///
/// A reference to a ListenerSet's Gateway without a section name also
/// selects the ListenerSet; with a section name it only selects the
/// Gateway's own listener of that name.
pub fn route_can_attach_to_listener_parent(
    parent_ref: &ParentReference,
    route_namespace: &str,
    parent: ListenerParent<'_>,
) -> bool {
    match parent {
        ListenerParent::Gateway(gateway) => parent_ref.targets(&gateway.gknn(), route_namespace),
        ListenerParent::ListenerSet(set) => {
            if parent_ref.targets(&set.gknn(), route_namespace) {
                return true;
            }
            parent_ref.section_name.is_none() && parent_ref.targets(&set.gateway, route_namespace)
        }
    }
}

/// The route kinds a listener admits: its explicit `allowedRoutes.kinds`, or
/// otherwise the kinds implied by its protocol.
pub fn allowed_kinds(listener: &Listener) -> Vec<RouteGroupKind> {
    if let Some(allowed) = listener.allowed_routes.as_ref() {
        if !allowed.kinds.is_empty() {
            return allowed.kinds.clone();
        }
    }

    match listener.protocol {
        Protocol::Http | Protocol::Https => vec![
            RouteGroupKind::gateway(HTTP_ROUTE_KIND),
            RouteGroupKind::gateway(GRPC_ROUTE_KIND),
        ],
        Protocol::Tls => vec![RouteGroupKind::gateway(TLS_ROUTE_KIND)],
        Protocol::Tcp => vec![RouteGroupKind::gateway(TCP_ROUTE_KIND)],
        Protocol::Other(_) => vec![],
    }
}

pub fn is_kind_allowed(listener: &Listener, group: &str, kind: &str) -> bool {
    allowed_kinds(listener)
        .iter()
        .any(|gk| gk.group == group && gk.kind == kind)
}

/// Returns whether a route in `route_namespace` may attach to `listener`,
/// owned by a parent in `parent_namespace`.
///
/// A `Selector` filter without a usable selector is a configuration error for
/// this listener only.
pub fn is_namespace_allowed(
    listener: &Listener,
    parent_namespace: &str,
    route_namespace: &str,
    namespaces: &impl NamespaceLookup,
) -> Result<bool, ListenerError> {
    let allowed = listener
        .allowed_routes
        .as_ref()
        .map(|a| &a.namespaces)
        .unwrap_or(&AllowedNamespaces::Same);

    match allowed {
        AllowedNamespaces::Same => Ok(parent_namespace == route_namespace),
        AllowedNamespaces::All => Ok(true),
        AllowedNamespaces::Selector(None) => Err(ListenerError::MissingSelector),
        AllowedNamespaces::InvalidSelector(error) => {
            Err(ListenerError::InvalidSelector(error.clone()))
        }
        AllowedNamespaces::Selector(Some(selector)) => Ok(namespaces
            .namespace_labels(route_namespace)
            .map(|labels| selector.matches(&labels))
            .unwrap_or(false)),
    }
}

/// Validates the listener's own namespace filter independently of any route.
pub fn validate_allowed_namespaces(listener: &Listener) -> Result<(), ListenerError> {
    match listener.allowed_routes.as_ref().map(|a| &a.namespaces) {
        Some(AllowedNamespaces::Selector(None)) => Err(ListenerError::MissingSelector),
        Some(AllowedNamespaces::InvalidSelector(error)) => {
            Err(ListenerError::InvalidSelector(error.clone()))
        }
        _ => Ok(()),
    }
}

/// A reference's port and section name, when set, must equal the listener's.
pub fn parent_ref_matches_listener(parent_ref: &ParentReference, listener: &Listener) -> bool {
    if let Some(port) = parent_ref.port {
        if port != listener.port {
            return false;
        }
    }
    if let Some(section) = parent_ref.section_name.as_deref() {
        if section != listener.name {
            return false;
        }
    }
    true
}
