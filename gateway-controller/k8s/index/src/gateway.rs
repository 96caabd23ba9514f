use crate::routes::port;
use anyhow::{anyhow, Result};
use linkerd_gateway_controller_core::{
    gateway::{
        AllowedListeners, AllowedNamespaces, AllowedRoutes, Gateway, Listener, ListenerSet,
        Protocol, RouteGroupKind,
    },
    labels::{Expression, Selector},
    routes::{GroupKindNamespaceName, GATEWAY_API_GROUP, GATEWAY_KIND},
};
use linkerd_gateway_controller_k8s_api::{self as api, ResourceExt};

pub fn gateway(gateway: &api::Gateway) -> Result<Gateway> {
    let namespace = gateway
        .namespace()
        .ok_or_else(|| anyhow!("Gateway must have a namespace"))?;

    let allowed_listeners = match gateway
        .spec
        .allowed_listeners
        .as_ref()
        .and_then(|a| a.namespaces.as_ref())
        .and_then(|n| n.from.as_deref())
    {
        None | Some("None") => AllowedListeners::None,
        Some("Same") => AllowedListeners::Same,
        Some("All") => AllowedListeners::All,
        Some(from) => {
            tracing::warn!(
                %namespace,
                name = %gateway.name_unchecked(),
                %from,
                "Unsupported allowedListeners; admitting none"
            );
            AllowedListeners::None
        }
    };

    Ok(Gateway {
        namespace: namespace.to_string(),
        name: gateway.name_unchecked().to_string(),
        listeners: listeners(&gateway.spec.listeners)?,
        allowed_listeners,
    })
}

pub fn listener_set(set: &api::ListenerSet) -> Result<ListenerSet> {
    let namespace = set
        .namespace()
        .ok_or_else(|| anyhow!("ListenerSet must have a namespace"))?;
    let parent = &set.spec.parent_ref;

    Ok(ListenerSet {
        namespace: namespace.to_string(),
        name: set.name_unchecked().to_string(),
        gateway: GroupKindNamespaceName {
            group: parent
                .group
                .clone()
                .unwrap_or_else(|| GATEWAY_API_GROUP.to_string())
                .into(),
            kind: parent
                .kind
                .clone()
                .unwrap_or_else(|| GATEWAY_KIND.to_string())
                .into(),
            namespace: parent
                .namespace
                .clone()
                .unwrap_or_else(|| namespace.to_string())
                .into(),
            name: parent.name.clone().into(),
        },
        listeners: listeners(&set.spec.listeners)?,
    })
}

fn listeners(listeners: &[api::Listener]) -> Result<Vec<Listener>> {
    listeners.iter().map(listener).collect()
}

fn listener(listener: &api::Listener) -> Result<Listener> {
    let protocol = match listener.protocol.parse::<Protocol>() {
        Ok(protocol) => protocol,
        Err(never) => match never {},
    };

    Ok(Listener {
        name: listener.name.clone(),
        protocol,
        port: port(listener.port)?,
        hostname: listener.hostname.clone(),
        allowed_routes: listener.allowed_routes.as_ref().map(allowed_routes),
    })
}

/// Selector problems are kept on the listener, not raised, so that they
/// fail only that listener.
fn allowed_routes(allowed: &api::AllowedRoutes) -> AllowedRoutes {
    let namespaces = match allowed.namespaces.as_ref() {
        None => AllowedNamespaces::Same,
        Some(namespaces) => match namespaces.from.as_deref() {
            None | Some("Same") => AllowedNamespaces::Same,
            Some("All") => AllowedNamespaces::All,
            Some("Selector") => match namespaces.selector.as_ref().map(selector).transpose() {
                Ok(selector) => AllowedNamespaces::Selector(selector),
                Err(error) => AllowedNamespaces::InvalidSelector(error.to_string()),
            },
            Some(from) => {
                AllowedNamespaces::InvalidSelector(format!("unsupported namespaces.from {from:?}"))
            }
        },
    };

    let kinds = allowed
        .kinds
        .iter()
        .flatten()
        .map(|gk| RouteGroupKind {
            group: gk
                .group
                .clone()
                .unwrap_or_else(|| GATEWAY_API_GROUP.to_string())
                .into(),
            kind: gk.kind.clone().into(),
        })
        .collect();

    AllowedRoutes { namespaces, kinds }
}

fn selector(selector: &api::LabelSelector) -> Result<Selector> {
    let expressions = selector
        .match_expressions
        .as_ref()
        .map(|exprs| {
            exprs
                .iter()
                .map(|expr| {
                    Ok(Expression {
                        key: expr.key.clone(),
                        operator: expr.operator.parse()?,
                        values: expr.values.iter().flatten().cloned().collect(),
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    Ok(Selector::new(selector.match_labels.clone(), expressions))
}
