use crate::{http_route::HttpRouteMatch, labels::Labels};
use chrono::{offset::Utc, DateTime};
use std::{borrow::Cow, fmt, num::NonZeroU16, sync::Arc};

pub use self::delegate::{
    DelegateRef, DelegateTarget, ALL_NAMESPACES, DELEGATION_LABEL, DELEGATION_LABEL_GROUP,
    DELEGATION_LABEL_KIND,
};

mod delegate;

pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";
pub const GATEWAY_KIND: &str = "Gateway";
pub const LISTENER_SET_KIND: &str = "XListenerSet";
pub const HTTP_ROUTE_KIND: &str = "HTTPRoute";
pub const GRPC_ROUTE_KIND: &str = "GRPCRoute";
pub const TLS_ROUTE_KIND: &str = "TLSRoute";
pub const TCP_ROUTE_KIND: &str = "TCPRoute";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKindName {
    pub group: Cow<'static, str>,
    pub kind: Cow<'static, str>,
    pub name: Cow<'static, str>,
}

/// Identifies a resource by its group, kind, namespace and name.
///
/// This is the unit of reference equality throughout route resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKindNamespaceName {
    pub group: Cow<'static, str>,
    pub kind: Cow<'static, str>,
    pub namespace: Cow<'static, str>,
    pub name: Cow<'static, str>,
}

/// A reference from a route to a Gateway, a ListenerSet or, when delegating,
/// to another route.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParentReference {
    pub group: Cow<'static, str>,
    pub kind: Cow<'static, str>,
    pub namespace: Option<String>,
    pub name: String,
    pub section_name: Option<String>,
    pub port: Option<NonZeroU16>,
}

/// Metadata shared by all route kinds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub namespace: String,
    pub name: String,
    pub labels: Labels,

    /// Used to order routes by age; older routes take precedence.
    pub creation_timestamp: Option<DateTime<Utc>>,
}

/// A closed set of route kinds that may attach to a listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Http(Arc<HttpRoute>),
    Tcp(Arc<TcpRoute>),
    Tls(Arc<TlsRoute>),
    Grpc(Arc<GrpcRoute>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRoute {
    pub meta: RouteMeta,
    pub parent_refs: Vec<ParentReference>,
    pub hostnames: Vec<String>,
    pub rules: Vec<HttpRouteRule>,

    /// When set, this route, as a delegatee, inherits and extends its
    /// parent's match instead of being validated as a subset of it.
    pub inherit_parent_matcher: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRouteRule {
    pub name: Option<String>,
    pub matches: Vec<HttpRouteMatch>,
    pub backends: Vec<BackendOrDelegate>,
}

/// Each entry of a rule either names a concrete backend or delegates to
/// other routes, never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendOrDelegate {
    Backend(Backend),
    Delegate(DelegateRef),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Backend {
    pub group: Cow<'static, str>,
    pub kind: Cow<'static, str>,
    pub namespace: String,
    pub name: String,
    pub port: Option<NonZeroU16>,
    pub weight: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TcpRoute {
    pub meta: RouteMeta,
    pub parent_refs: Vec<ParentReference>,
    pub backends: Vec<Backend>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsRoute {
    pub meta: RouteMeta,
    pub parent_refs: Vec<ParentReference>,
    pub hostnames: Vec<String>,
    pub backends: Vec<Backend>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrpcRoute {
    pub meta: RouteMeta,
    pub parent_refs: Vec<ParentReference>,
    pub hostnames: Vec<String>,
    pub backends: Vec<Backend>,
}

// === impl GroupKindName ===

impl GroupKindName {
    pub fn namespaced(self, namespace: impl Into<Cow<'static, str>>) -> GroupKindNamespaceName {
        GroupKindNamespaceName {
            group: self.group,
            kind: self.kind,
            namespace: namespace.into(),
            name: self.name,
        }
    }
}

// === impl GroupKindNamespaceName ===

impl GroupKindNamespaceName {
    pub fn http_route(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            group: GATEWAY_API_GROUP.into(),
            kind: HTTP_ROUTE_KIND.into(),
            namespace: namespace.to_string().into(),
            name: name.to_string().into(),
        }
    }

    pub fn gateway(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            group: GATEWAY_API_GROUP.into(),
            kind: GATEWAY_KIND.into(),
            namespace: namespace.to_string().into(),
            name: name.to_string().into(),
        }
    }

    pub fn listener_set(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            group: GATEWAY_API_GROUP.into(),
            kind: LISTENER_SET_KIND.into(),
            namespace: namespace.to_string().into(),
            name: name.to_string().into(),
        }
    }

    pub fn gkn(&self) -> GroupKindName {
        GroupKindName {
            group: self.group.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for GroupKindNamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

// === impl ParentReference ===

impl ParentReference {
    /// The synthetic reference a delegated child reports against: the
    /// HTTPRoute that delegated to it.
    pub fn http_route(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            group: GATEWAY_API_GROUP.into(),
            kind: HTTP_ROUTE_KIND.into(),
            namespace: Some(namespace.to_string()),
            name: name.to_string(),
            section_name: None,
            port: None,
        }
    }

    pub fn gateway(name: impl ToString) -> Self {
        Self {
            group: GATEWAY_API_GROUP.into(),
            kind: GATEWAY_KIND.into(),
            namespace: None,
            name: name.to_string(),
            section_name: None,
            port: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl ToString) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_section_name(mut self, section_name: impl ToString) -> Self {
        self.section_name = Some(section_name.to_string());
        self
    }

    pub fn with_port(mut self, port: NonZeroU16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn namespace_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default)
    }

    /// Returns true if this reference names the given resource, resolving an
    /// omitted namespace against `default_namespace`.
    pub fn targets(&self, id: &GroupKindNamespaceName, default_namespace: &str) -> bool {
        self.group == id.group
            && self.kind == id.kind
            && self.name == id.name
            && self.namespace_or(default_namespace) == id.namespace
    }
}

// === impl Route ===

impl Route {
    pub fn meta(&self) -> &RouteMeta {
        match self {
            Self::Http(route) => &route.meta,
            Self::Tcp(route) => &route.meta,
            Self::Tls(route) => &route.meta,
            Self::Grpc(route) => &route.meta,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => HTTP_ROUTE_KIND,
            Self::Tcp(_) => TCP_ROUTE_KIND,
            Self::Tls(_) => TLS_ROUTE_KIND,
            Self::Grpc(_) => GRPC_ROUTE_KIND,
        }
    }

    pub fn group(&self) -> &'static str {
        GATEWAY_API_GROUP
    }

    pub fn namespace(&self) -> &str {
        &self.meta().namespace
    }

    pub fn name(&self) -> &str {
        &self.meta().name
    }

    pub fn gknn(&self) -> GroupKindNamespaceName {
        let meta = self.meta();
        GroupKindNamespaceName {
            group: self.group().into(),
            kind: self.kind().into(),
            namespace: meta.namespace.clone().into(),
            name: meta.name.clone().into(),
        }
    }

    pub fn parent_refs(&self) -> &[ParentReference] {
        match self {
            Self::Http(route) => &route.parent_refs,
            Self::Tcp(route) => &route.parent_refs,
            Self::Tls(route) => &route.parent_refs,
            Self::Grpc(route) => &route.parent_refs,
        }
    }

    /// TCPRoutes carry no hostnames.
    pub fn hostnames(&self) -> &[String] {
        match self {
            Self::Http(route) => &route.hostnames,
            Self::Tcp(_) => &[],
            Self::Tls(route) => &route.hostnames,
            Self::Grpc(route) => &route.hostnames,
        }
    }

    pub fn as_http(&self) -> Option<&Arc<HttpRoute>> {
        match self {
            Self::Http(route) => Some(route),
            _ => None,
        }
    }
}

// === impl RouteMeta ===

impl RouteMeta {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Orders routes by creation timestamp (oldest first, unknown last) and
    /// then by `namespace/name`.
    pub fn precedence_cmp(&self, other: &Self) -> std::cmp::Ordering {
        let by_age = match (self.creation_timestamp, other.creation_timestamp) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        by_age
            .then_with(|| self.namespace.cmp(&other.namespace))
            .then_with(|| self.name.cmp(&other.name))
    }
}

// === impl HttpRoute ===

impl HttpRoute {
    pub fn gknn(&self) -> GroupKindNamespaceName {
        GroupKindNamespaceName::http_route(&self.meta.namespace, &self.meta.name)
    }

    pub fn has_delegates(&self) -> bool {
        self.rules.iter().any(HttpRouteRule::has_delegates)
    }
}

// === impl HttpRouteRule ===

impl HttpRouteRule {
    pub fn has_delegates(&self) -> bool {
        self.backends
            .iter()
            .any(|b| matches!(b, BackendOrDelegate::Delegate(_)))
    }

    pub fn delegates(&self) -> impl Iterator<Item = &DelegateRef> {
        self.backends.iter().filter_map(|b| match b {
            BackendOrDelegate::Delegate(d) => Some(d),
            BackendOrDelegate::Backend(_) => None,
        })
    }

    pub fn concrete_backends(&self) -> impl Iterator<Item = &Backend> {
        self.backends.iter().filter_map(|b| match b {
            BackendOrDelegate::Backend(b) => Some(b),
            BackendOrDelegate::Delegate(_) => None,
        })
    }

    /// Gateway API treats a rule without matches as matching every request.
    pub fn matches_or_default(&self) -> Vec<HttpRouteMatch> {
        if self.matches.is_empty() {
            vec![HttpRouteMatch::default()]
        } else {
            self.matches.clone()
        }
    }
}
