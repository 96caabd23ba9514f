use crate::{
    core::{
        http_route::{HeaderMatch, HttpRouteMatch, PathMatch, QueryParamMatch},
        routes::{Backend, ParentReference},
        RouteInfo,
    },
    index::{FlatRoute, ListenerResult, Resolution},
    status::Update,
};
use serde::Serialize;

/// A serializable summary of one resolution pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub listeners: Vec<ListenerReport>,
    pub route_errors: Vec<RouteErrorReport>,
    pub routes: Vec<ListenerRoutesReport>,
    pub status_patches: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerReport {
    pub parent: String,
    pub listener: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorReport {
    pub route: String,
    pub parent_ref: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerRoutesReport {
    pub parent: String,
    pub listener: String,
    pub routes: Vec<FlatRouteReport>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRouteReport {
    pub name: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    pub hostnames: Vec<String>,
    #[serde(rename = "match")]
    pub route_match: MatchReport,
    pub backends: Vec<BackendReport>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BackendReport {
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub weight: u32,
}

// === impl Report ===

impl Report {
    pub fn new(resolution: &Resolution, statuses: &[Update]) -> Self {
        Self {
            listeners: resolution.listeners.iter().map(ListenerReport::new).collect(),
            route_errors: resolution
                .route_errors
                .iter()
                .map(|e| RouteErrorReport {
                    route: e.route.to_string(),
                    parent_ref: parent_ref_name(&e.parent_ref, &e.route.namespace),
                    reason: e.reason.to_string(),
                })
                .collect(),
            routes: resolution
                .flattened
                .iter()
                .map(|l| ListenerRoutesReport {
                    parent: l.parent.to_string(),
                    listener: l.listener.clone(),
                    routes: l.routes.iter().map(FlatRouteReport::new).collect(),
                })
                .collect(),
            status_patches: statuses.iter().map(Update::patch).collect(),
        }
    }
}

impl ListenerReport {
    fn new(listener: &ListenerResult) -> Self {
        let (routes, error) = match &listener.result {
            Ok(roots) => (roots.iter().map(root_name).collect(), None),
            Err(error) => (vec![], Some(error.to_string())),
        };
        Self {
            parent: listener.parent.to_string(),
            listener: listener.listener.clone(),
            routes,
            error,
        }
    }
}

impl FlatRouteReport {
    fn new(route: &FlatRoute) -> Self {
        Self {
            name: route.name.clone(),
            source: route.source.to_string(),
            rule_name: route.rule_name.clone(),
            hostnames: route.hostnames.clone(),
            route_match: MatchReport::new(&route.route_match),
            backends: route.backends.iter().map(BackendReport::new).collect(),
        }
    }
}

impl MatchReport {
    fn new(route_match: &HttpRouteMatch) -> Self {
        let path = match route_match.path_or_default() {
            PathMatch::Exact(path) => format!("= {path}"),
            PathMatch::Prefix(prefix) => format!("{prefix}*"),
            PathMatch::Regex(re) => format!("~ {re}"),
        };
        Self {
            path,
            headers: route_match
                .headers
                .iter()
                .map(|h| match h {
                    HeaderMatch::Exact(name, value) => {
                        format!("{name}={}", String::from_utf8_lossy(value.as_bytes()))
                    }
                    HeaderMatch::Regex(name, re) => format!("{name}~{re}"),
                })
                .collect(),
            query_params: route_match
                .query_params
                .iter()
                .map(|q| match q {
                    QueryParamMatch::Exact(name, value) => format!("{name}={value}"),
                    QueryParamMatch::Regex(name, re) => format!("{name}~{re}"),
                })
                .collect(),
            method: route_match.method.as_ref().map(ToString::to_string),
        }
    }
}

impl BackendReport {
    fn new(backend: &Backend) -> Self {
        Self {
            kind: backend.kind.to_string(),
            name: format!("{}/{}", backend.namespace, backend.name),
            port: backend.port.map(|p| p.get()),
            weight: backend.weight,
        }
    }
}

fn root_name(root: &RouteInfo) -> String {
    root.route.gknn().to_string()
}

/// `{kind}/{namespace}/{name}`, suffixed with `#{section}` and `:{port}` when
/// the reference narrows to a listener.
fn parent_ref_name(parent_ref: &ParentReference, route_namespace: &str) -> String {
    let mut name = format!(
        "{}/{}/{}",
        parent_ref.kind,
        parent_ref.namespace_or(route_namespace),
        parent_ref.name
    );
    if let Some(section) = parent_ref.section_name.as_deref() {
        name.push('#');
        name.push_str(section);
    }
    if let Some(port) = parent_ref.port {
        name.push(':');
        name.push_str(&port.to_string());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{routes::GroupKindNamespaceName, RouteError, RouteErrorReason};
    use pretty_assertions::assert_eq;
    use std::num::NonZeroU16;

    #[test]
    fn names_parent_refs() {
        let parent_ref = ParentReference::gateway("gw")
            .with_section_name("http")
            .with_port(NonZeroU16::new(80).unwrap());
        assert_eq!(parent_ref_name(&parent_ref, "apps"), "Gateway/apps/gw#http:80");
        assert_eq!(
            parent_ref_name(&ParentReference::gateway("gw").with_namespace("infra"), "apps"),
            "Gateway/infra/gw"
        );
    }

    #[test]
    fn describes_matches() {
        let report = MatchReport::new(&HttpRouteMatch {
            path: Some(PathMatch::Exact("/login".to_string())),
            query_params: vec![QueryParamMatch::Exact("v".to_string(), "2".to_string())],
            ..Default::default()
        });
        assert_eq!(report.path, "= /login");
        assert_eq!(report.query_params, vec!["v=2".to_string()]);
        assert!(report.headers.is_empty());
        assert_eq!(MatchReport::new(&HttpRouteMatch::default()).path, "/*");
    }

    #[test]
    fn reports_route_errors() {
        let resolution = Resolution {
            route_errors: vec![RouteError {
                route: GroupKindNamespaceName::http_route("apps", "web"),
                parent_ref: ParentReference::gateway("gw"),
                reason: RouteErrorReason::NoMatchingParent,
            }],
            ..Default::default()
        };
        let report = Report::new(&resolution, &[]);
        assert_eq!(
            report.route_errors,
            vec![RouteErrorReport {
                route: "HTTPRoute/apps/web".to_string(),
                parent_ref: "Gateway/apps/gw".to_string(),
                reason: RouteErrorReason::NoMatchingParent.to_string(),
            }]
        );
        assert!(report.listeners.is_empty());
        assert!(report.status_patches.is_empty());
    }
}
