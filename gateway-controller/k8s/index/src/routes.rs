use anyhow::{anyhow, bail, Result};
use linkerd_gateway_controller_core::{
    labels::Labels,
    routes::{
        Backend, BackendOrDelegate, DelegateRef, GroupKindNamespaceName, GrpcRoute, HttpRoute,
        HttpRouteRule, ParentReference, RouteMeta, TcpRoute, TlsRoute, DELEGATION_LABEL_GROUP,
        GATEWAY_API_GROUP, GATEWAY_KIND, HTTP_ROUTE_KIND,
    },
};
use linkerd_gateway_controller_k8s_api::{self as api, ResourceExt};
use std::num::NonZeroU16;

pub mod http;

const SERVICE_KIND: &str = "Service";

pub fn http_route(route: &api::HttpRoute) -> Result<HttpRoute> {
    let meta = route_meta(route)?;
    let inherit_parent_matcher = route
        .annotation(api::INHERIT_PARENT_MATCHER_ANNOTATION)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let parent_refs = parent_refs(&route.spec.inner)?;
    let rules = route
        .spec
        .rules
        .iter()
        .flatten()
        .map(|rule| http_rule(&meta.namespace, rule.clone()))
        .collect::<Result<_>>()?;

    Ok(HttpRoute {
        meta,
        parent_refs,
        hostnames: route.spec.hostnames.clone().unwrap_or_default(),
        rules,
        inherit_parent_matcher,
    })
}

fn http_rule(
    namespace: &str,
    api::HttpRouteRule {
        name,
        matches,
        backend_refs,
    }: api::HttpRouteRule,
) -> Result<HttpRouteRule> {
    let matches = matches
        .into_iter()
        .flatten()
        .map(http::try_match)
        .collect::<Result<_>>()?;

    let backends = backend_refs
        .into_iter()
        .flatten()
        .map(|backend| backend_or_delegate(namespace, backend))
        .collect::<Result<_>>()?;

    Ok(HttpRouteRule {
        name,
        matches,
        backends,
    })
}

pub fn tcp_route(route: &api::TcpRoute) -> Result<TcpRoute> {
    let meta = route_meta(route)?;
    Ok(TcpRoute {
        parent_refs: parent_refs(&route.spec.inner)?,
        backends: rule_backends(&meta.namespace, &route.spec.rules)?,
        meta,
    })
}

pub fn tls_route(route: &api::TlsRoute) -> Result<TlsRoute> {
    let meta = route_meta(route)?;
    Ok(TlsRoute {
        parent_refs: parent_refs(&route.spec.inner)?,
        hostnames: route.spec.hostnames.clone().unwrap_or_default(),
        backends: rule_backends(&meta.namespace, &route.spec.rules)?,
        meta,
    })
}

pub fn grpc_route(route: &api::GrpcRoute) -> Result<GrpcRoute> {
    let meta = route_meta(route)?;
    Ok(GrpcRoute {
        parent_refs: parent_refs(&route.spec.inner)?,
        hostnames: route.spec.hostnames.clone().unwrap_or_default(),
        backends: rule_backends(&meta.namespace, &route.spec.rules)?,
        meta,
    })
}

fn route_meta(route: &impl ResourceExt) -> Result<RouteMeta> {
    let namespace = route
        .namespace()
        .ok_or_else(|| anyhow!("route must have a namespace"))?;
    let metadata = route.metadata();
    Ok(RouteMeta {
        namespace: namespace.to_string(),
        name: route.name_unchecked().to_string(),
        labels: Labels::from(metadata.labels.clone().unwrap_or_default()),
        creation_timestamp: metadata
            .creation_timestamp
            .as_ref()
            .map(|api::Time(t)| *t),
    })
}

fn parent_refs(spec: &api::CommonRouteSpec) -> Result<Vec<ParentReference>> {
    spec.parent_refs
        .iter()
        .flatten()
        .map(parent_ref)
        .collect()
}

pub fn parent_ref(parent_ref: &api::ParentReference) -> Result<ParentReference> {
    Ok(ParentReference {
        group: parent_ref
            .group
            .clone()
            .unwrap_or_else(|| GATEWAY_API_GROUP.to_string())
            .into(),
        kind: parent_ref
            .kind
            .clone()
            .unwrap_or_else(|| GATEWAY_KIND.to_string())
            .into(),
        namespace: parent_ref.namespace.clone(),
        name: parent_ref.name.clone(),
        section_name: parent_ref.section_name.clone(),
        port: parent_ref.port.map(port).transpose()?,
    })
}

/// HTTPRoute backends of the HTTPRoute kind, or of the delegation label
/// group, delegate; everything else names a concrete backend.
pub fn backend_or_delegate(namespace: &str, backend: api::BackendRef) -> Result<BackendOrDelegate> {
    let group = backend.group.unwrap_or_default();
    let namespace = backend.namespace.unwrap_or_else(|| namespace.to_string());

    let delegates = group == DELEGATION_LABEL_GROUP
        || (group == GATEWAY_API_GROUP && backend.kind.as_deref() == Some(HTTP_ROUTE_KIND));
    if delegates {
        return Ok(BackendOrDelegate::Delegate(DelegateRef(
            GroupKindNamespaceName {
                group: group.into(),
                kind: backend.kind.unwrap_or_default().into(),
                namespace: namespace.into(),
                name: backend.name.into(),
            },
        )));
    }

    let weight = match backend.weight {
        None => 1,
        Some(w) => u32::try_from(w).map_err(|_| anyhow!("backend weight {w} is negative"))?,
    };
    Ok(BackendOrDelegate::Backend(Backend {
        group: group.into(),
        kind: backend
            .kind
            .unwrap_or_else(|| SERVICE_KIND.to_string())
            .into(),
        namespace,
        name: backend.name,
        port: backend.port.map(port).transpose()?,
        weight,
    }))
}

fn rule_backends(namespace: &str, rules: &[api::routes::BackendRules]) -> Result<Vec<Backend>> {
    rules
        .iter()
        .flat_map(|rule| rule.backend_refs.iter())
        .map(|backend| match backend_or_delegate(namespace, backend.clone())? {
            BackendOrDelegate::Backend(backend) => Ok(backend),
            BackendOrDelegate::Delegate(delegate) => {
                bail!("only HTTPRoutes may delegate; found {delegate}")
            }
        })
        .collect()
}

pub(crate) fn port(port: i32) -> Result<NonZeroU16> {
    u16::try_from(port)
        .ok()
        .and_then(NonZeroU16::new)
        .ok_or_else(|| anyhow!("invalid port number {port}"))
}
