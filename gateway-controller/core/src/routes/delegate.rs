use super::{GroupKindNamespaceName, GATEWAY_API_GROUP, HTTP_ROUTE_KIND};
use crate::RouteErrorReason;
use std::fmt;

/// The group of a delegate reference that selects child routes by label.
pub const DELEGATION_LABEL_GROUP: &str = "delegation.linkerd.io";

/// The kind of a delegate reference that selects child routes by label.
pub const DELEGATION_LABEL_KIND: &str = "label";

/// The label whose value a label-selecting delegate reference matches.
pub const DELEGATION_LABEL: &str = "delegation.linkerd.io/label";

/// A label-selecting delegate reference with this namespace searches all
/// namespaces.
pub const ALL_NAMESPACES: &str = "all";

/// A rule backend that hands matching authority to other HTTPRoutes.
///
/// The namespace has already been defaulted to the delegating route's
/// namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelegateRef(pub GroupKindNamespaceName);

/// The three forms a delegate reference may take.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DelegateTarget<'a> {
    /// A single HTTPRoute, by name.
    Name { namespace: &'a str, name: &'a str },

    /// Every HTTPRoute in a namespace (`""` or `"*"` as the name).
    Wildcard { namespace: &'a str },

    /// HTTPRoutes labeled with `DELEGATION_LABEL=label`. A `None` namespace
    /// searches all namespaces.
    Selector {
        namespace: Option<&'a str>,
        label: &'a str,
    },
}

// === impl DelegateRef ===

impl DelegateRef {
    pub fn route(namespace: impl ToString, name: impl ToString) -> Self {
        Self(GroupKindNamespaceName::http_route(namespace, name))
    }

    pub fn wildcard(namespace: impl ToString) -> Self {
        Self::route(namespace, "*")
    }

    pub fn label(namespace: impl ToString, label: impl ToString) -> Self {
        Self(GroupKindNamespaceName {
            group: DELEGATION_LABEL_GROUP.into(),
            kind: DELEGATION_LABEL_KIND.into(),
            namespace: namespace.to_string().into(),
            name: label.to_string().into(),
        })
    }

    pub fn id(&self) -> &GroupKindNamespaceName {
        &self.0
    }

    /// Classifies the reference.
    ///
    /// A reference without a kind is malformed; one whose group and kind are
    /// neither an HTTPRoute nor the label sentinel cannot be resolved.
    pub fn target(&self) -> Result<DelegateTarget<'_>, RouteErrorReason> {
        let GroupKindNamespaceName {
            group,
            kind,
            namespace,
            name,
        } = &self.0;

        if kind.is_empty() {
            return Err(RouteErrorReason::LocalObjRefMissingKind);
        }

        if group == DELEGATION_LABEL_GROUP && kind == DELEGATION_LABEL_KIND {
            let namespace = (namespace != ALL_NAMESPACES).then_some(&**namespace);
            return Ok(DelegateTarget::Selector {
                namespace,
                label: name,
            });
        }

        if group == GATEWAY_API_GROUP && kind == HTTP_ROUTE_KIND {
            if name.is_empty() || name == "*" {
                return Ok(DelegateTarget::Wildcard { namespace });
            }
            return Ok(DelegateTarget::Name { namespace, name });
        }

        Err(RouteErrorReason::UnresolvedReference)
    }
}

impl fmt::Display for DelegateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}/{}/{}",
            self.0.kind, self.0.group, self.0.namespace, self.0.name
        )
    }
}
