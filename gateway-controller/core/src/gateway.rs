use crate::{
    labels::Selector,
    routes::{GroupKindNamespaceName, GATEWAY_API_GROUP},
};
use std::{borrow::Cow, num::NonZeroU16};

/// A Gateway and the listeners it declares directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gateway {
    pub namespace: String,
    pub name: String,
    pub listeners: Vec<Listener>,
    pub allowed_listeners: AllowedListeners,
}

/// A set of listeners declared outside of, and merged into, a Gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerSet {
    pub namespace: String,
    pub name: String,

    /// The Gateway this set attaches to.
    pub gateway: GroupKindNamespaceName,
    pub listeners: Vec<Listener>,
}

/// Either resource may own listeners that routes attach to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListenerParent<'a> {
    Gateway(&'a Gateway),
    ListenerSet(&'a ListenerSet),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listener {
    pub name: String,
    pub protocol: Protocol,
    pub port: NonZeroU16,
    pub hostname: Option<String>,
    pub allowed_routes: Option<AllowedRoutes>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
    Tls,
    Tcp,
    Other(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowedRoutes {
    pub namespaces: AllowedNamespaces,

    /// When empty, the kinds are derived from the listener's protocol.
    pub kinds: Vec<RouteGroupKind>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AllowedNamespaces {
    #[default]
    Same,
    All,
    Selector(Option<Selector>),
    InvalidSelector(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteGroupKind {
    pub group: Cow<'static, str>,
    pub kind: Cow<'static, str>,
}

/// Which ListenerSets a Gateway admits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AllowedListeners {
    #[default]
    None,
    Same,
    All,
}

// === impl Gateway ===

impl Gateway {
    pub fn gknn(&self) -> GroupKindNamespaceName {
        GroupKindNamespaceName::gateway(&self.namespace, &self.name)
    }

    pub fn admits(&self, set: &ListenerSet) -> bool {
        if set.gateway != self.gknn() {
            return false;
        }
        match self.allowed_listeners {
            AllowedListeners::None => false,
            AllowedListeners::Same => set.namespace == self.namespace,
            AllowedListeners::All => true,
        }
    }
}

// === impl ListenerSet ===

impl ListenerSet {
    pub fn gknn(&self) -> GroupKindNamespaceName {
        GroupKindNamespaceName::listener_set(&self.namespace, &self.name)
    }
}

// === impl ListenerParent ===

impl ListenerParent<'_> {
    pub fn gknn(&self) -> GroupKindNamespaceName {
        match self {
            Self::Gateway(gw) => gw.gknn(),
            Self::ListenerSet(set) => set.gknn(),
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            Self::Gateway(gw) => &gw.namespace,
            Self::ListenerSet(set) => &set.namespace,
        }
    }

    pub fn listeners(&self) -> &[Listener] {
        match self {
            Self::Gateway(gw) => &gw.listeners,
            Self::ListenerSet(set) => &set.listeners,
        }
    }
}

// === impl Protocol ===

impl std::str::FromStr for Protocol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "HTTP" => Self::Http,
            "HTTPS" => Self::Https,
            "TLS" => Self::Tls,
            "TCP" => Self::Tcp,
            other => Self::Other(other.to_string()),
        })
    }
}

// === impl RouteGroupKind ===

impl RouteGroupKind {
    pub fn gateway(kind: &'static str) -> Self {
        Self {
            group: GATEWAY_API_GROUP.into(),
            kind: kind.into(),
        }
    }
}
