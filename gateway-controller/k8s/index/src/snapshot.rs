use crate::{gateway, routes};
use ahash::AHashMap as HashMap;
use linkerd_gateway_controller_core::{
    gateway::{Gateway, ListenerSet},
    labels::Labels,
    routes::{HttpRoute, Route, DELEGATION_LABEL},
    NamespaceLookup, RouteLookup,
};
use linkerd_gateway_controller_k8s_api::{self as api, ResourceExt};
use std::sync::Arc;

/// An immutable, fully converted view of the cluster resources one
/// resolution pass reads.
///
/// Routes are held in precedence order so that every lookup returns them in
/// a stable order.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    gateways: Vec<Gateway>,
    listener_sets: Vec<ListenerSet>,
    routes: Vec<Route>,
    http_routes: Vec<Arc<HttpRoute>>,
    http_routes_by_namespace: HashMap<String, Vec<Arc<HttpRoute>>>,
    namespaces: HashMap<String, Labels>,
}

// === impl Snapshot ===

impl Snapshot {
    pub fn new(
        mut gateways: Vec<Gateway>,
        mut listener_sets: Vec<ListenerSet>,
        mut routes: Vec<Route>,
        namespaces: impl IntoIterator<Item = (String, Labels)>,
    ) -> Self {
        gateways.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
        listener_sets.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
        routes.sort_by(|a, b| a.meta().precedence_cmp(b.meta()));

        let http_routes = routes
            .iter()
            .filter_map(Route::as_http)
            .cloned()
            .collect::<Vec<_>>();
        let mut http_routes_by_namespace = HashMap::<String, Vec<Arc<HttpRoute>>>::new();
        for route in &http_routes {
            http_routes_by_namespace
                .entry(route.meta.namespace.clone())
                .or_default()
                .push(route.clone());
        }

        Self {
            gateways,
            listener_sets,
            routes,
            http_routes,
            http_routes_by_namespace,
            namespaces: namespaces.into_iter().collect(),
        }
    }

    /// Converts API documents, skipping any resource that cannot be
    /// converted.
    pub fn from_resources(resources: &api::ResourceSnapshot) -> Self {
        let gateways = convert_all("Gateway", &resources.gateways, gateway::gateway);
        let listener_sets =
            convert_all("ListenerSet", &resources.listener_sets, gateway::listener_set);

        let mut all_routes = Vec::new();
        all_routes.extend(
            convert_all("HTTPRoute", &resources.http_routes, routes::http_route)
                .into_iter()
                .map(|r| Route::Http(Arc::new(r))),
        );
        all_routes.extend(
            convert_all("TCPRoute", &resources.tcp_routes, routes::tcp_route)
                .into_iter()
                .map(|r| Route::Tcp(Arc::new(r))),
        );
        all_routes.extend(
            convert_all("TLSRoute", &resources.tls_routes, routes::tls_route)
                .into_iter()
                .map(|r| Route::Tls(Arc::new(r))),
        );
        all_routes.extend(
            convert_all("GRPCRoute", &resources.grpc_routes, routes::grpc_route)
                .into_iter()
                .map(|r| Route::Grpc(Arc::new(r))),
        );

        let namespaces = resources.namespaces.iter().map(|ns| {
            let labels = ns.metadata.labels.clone().unwrap_or_default();
            (ns.name_unchecked().to_string(), Labels::from(labels))
        });

        Self::new(gateways, listener_sets, all_routes, namespaces)
    }

    pub fn gateways(&self) -> &[Gateway] {
        &self.gateways
    }

    pub fn listener_sets(&self) -> &[ListenerSet] {
        &self.listener_sets
    }

    /// All routes, in precedence order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

fn convert_all<R: ResourceExt, T>(
    kind: &'static str,
    resources: &[R],
    convert: impl Fn(&R) -> anyhow::Result<T>,
) -> Vec<T> {
    resources
        .iter()
        .filter_map(|resource| match convert(resource) {
            Ok(converted) => Some(converted),
            Err(error) => {
                tracing::warn!(
                    %kind,
                    namespace = resource.namespace().unwrap_or_default(),
                    name = %resource.name_unchecked(),
                    %error,
                    "Skipping invalid resource"
                );
                None
            }
        })
        .collect()
}

impl RouteLookup for Snapshot {
    fn fetch_by_name(&self, namespace: &str, name: &str) -> Option<Arc<HttpRoute>> {
        self.http_routes_by_namespace
            .get(namespace)?
            .iter()
            .find(|route| route.meta.name == name)
            .cloned()
    }

    fn fetch_by_namespace(&self, namespace: &str) -> Vec<Arc<HttpRoute>> {
        self.http_routes_by_namespace
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }

    fn fetch_by_selector(&self, namespace: Option<&str>, label: &str) -> Vec<Arc<HttpRoute>> {
        let candidates = match namespace {
            Some(namespace) => match self.http_routes_by_namespace.get(namespace) {
                Some(routes) => routes.as_slice(),
                None => return vec![],
            },
            None => self.http_routes.as_slice(),
        };
        candidates
            .iter()
            .filter(|route| route.meta.labels.get(DELEGATION_LABEL) == Some(label))
            .cloned()
            .collect()
    }
}

impl NamespaceLookup for Snapshot {
    fn namespace_labels(&self, namespace: &str) -> Option<Labels> {
        self.namespaces.get(namespace).cloned()
    }
}
