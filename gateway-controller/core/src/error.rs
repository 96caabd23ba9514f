use crate::routes::{GroupKindNamespaceName, ParentReference};

/// Why a route failed to bind or why a delegate reference failed to
/// resolve.
///
/// None of these abort a resolution pass; each is scoped to one route,
/// parent reference or delegate slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum RouteErrorReason {
    #[error("route kind or namespace is not allowed by any listener")]
    NotAllowedByListeners,

    #[error("no listener matches the parent reference's port or section name")]
    NoMatchingParent,

    #[error("listener and route hostnames do not intersect")]
    NoMatchingListenerHostname,

    #[error("delegate reference does not resolve to any route")]
    UnresolvedReference,

    #[error("delegate reference would revisit an ancestor route")]
    CyclicReference,

    #[error("reference is missing a kind")]
    LocalObjRefMissingKind,

    #[error("delegation exceeds the maximum depth of {0}")]
    DelegationDepthExceeded(usize),

    #[error("delegation tree exceeds {0} routes")]
    DelegationTreeTooLarge(usize),
}

/// A configuration problem scoped to a single listener.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    #[error("allowedRoutes.namespaces.from is Selector but no selector is set")]
    MissingSelector,

    #[error("invalid namespace selector: {0}")]
    InvalidSelector(String),
}

/// A route that failed to bind to any listener of a parent it references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteError {
    pub route: GroupKindNamespaceName,
    pub parent_ref: ParentReference,
    pub reason: RouteErrorReason,
}
