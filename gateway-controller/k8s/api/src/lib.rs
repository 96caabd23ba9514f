//! Kubernetes-shaped resource documents consumed by the gateway controller.
//!
//! These mirror the Gateway API's `gateway.networking.k8s.io` resources
//! closely enough to be read from manifests; only the fields route
//! attachment and delegation depend on are modeled.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod gateway;
pub mod routes;

pub use self::{
    gateway::{
        AllowedListeners, AllowedRoutes, Gateway, GatewaySpec, Listener, ListenerNamespaces,
        ListenerSet, ListenerSetSpec, RouteGroupKind, RouteNamespaces,
    },
    routes::{
        BackendRef, CommonRouteSpec, GrpcRoute, HttpHeaderMatch, HttpPathMatch, HttpQueryParamMatch,
        HttpRoute, HttpRouteMatch, HttpRouteRule, HttpRouteSpec, ParentReference, TcpRoute,
        TlsRoute,
    },
};
pub use k8s_openapi::{
    api::core::v1::Namespace,
    apimachinery::pkg::apis::meta::v1::{
        Condition, LabelSelector, LabelSelectorRequirement, ObjectMeta, Time,
    },
};
use serde::{Deserialize, Serialize};

/// Annotation on an HTTPRoute opting it in to inheriting, rather than
/// narrowing, the match of the route that delegates to it.
pub const INHERIT_PARENT_MATCHER_ANNOTATION: &str = "delegation.linkerd.io/inherit-parent-matcher";

/// Every resource one resolution pass reads.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceSnapshot {
    pub gateways: Vec<Gateway>,
    pub listener_sets: Vec<ListenerSet>,
    pub http_routes: Vec<HttpRoute>,
    pub tcp_routes: Vec<TcpRoute>,
    pub tls_routes: Vec<TlsRoute>,
    pub grpc_routes: Vec<GrpcRoute>,
    pub namespaces: Vec<Namespace>,
}

/// Accessors for the metadata every resource document carries.
pub trait ResourceExt {
    fn metadata(&self) -> &ObjectMeta;

    fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    fn name_unchecked(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata()
            .annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(String::as_str)
    }
}

macro_rules! impl_resource_ext {
    ($($ty:ty),+) => {
        $(
            impl ResourceExt for $ty {
                fn metadata(&self) -> &ObjectMeta {
                    &self.metadata
                }
            }
        )+
    };
}

impl_resource_ext!(Gateway, ListenerSet, HttpRoute, TcpRoute, TlsRoute, GrpcRoute, Namespace);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_snapshot_yaml() {
        let snapshot: ResourceSnapshot = serde_yaml::from_str(
            r#"
gateways:
- metadata:
    namespace: test
    name: gw
  spec:
    gatewayClassName: linkerd
    listeners:
    - name: foo
      protocol: HTTP
      port: 80
httpRoutes:
- metadata:
    namespace: default
    name: test
    annotations:
      delegation.linkerd.io/inherit-parent-matcher: "true"
  spec:
    parentRefs:
    - name: gw
      namespace: test
    rules:
    - matches:
      - path:
          type: PathPrefix
          value: /
      backendRefs:
      - name: web
        port: 8080
"#,
        )
        .expect("snapshot must parse");

        assert_eq!(snapshot.gateways.len(), 1);
        let listener = &snapshot.gateways[0].spec.listeners[0];
        assert_eq!(listener.name, "foo");
        assert_eq!(listener.port, 80);

        let route = &snapshot.http_routes[0];
        assert_eq!(route.name_unchecked(), "test");
        assert_eq!(
            route.annotation(INHERIT_PARENT_MATCHER_ANNOTATION),
            Some("true")
        );
        let rules = route.spec.rules.as_ref().unwrap();
        let backend = &rules[0].backend_refs.as_ref().unwrap()[0];
        assert_eq!(backend.name, "web");
        assert_eq!(backend.port, Some(8080));
    }

    #[test]
    fn reads_snapshot_json() {
        let snapshot: ResourceSnapshot = serde_json::from_str(
            r#"{"namespaces":[{"metadata":{"name":"team-a","labels":{"team":"a"}}}]}"#,
        )
        .expect("snapshot must parse");
        assert_eq!(snapshot.namespaces[0].name_unchecked(), "team-a");
        assert!(snapshot.http_routes.is_empty());
    }
}
