use crate::{labels::Labels, routes::HttpRoute};
use std::sync::Arc;

/// Resolves candidate child routes for delegation.
///
/// Implementations read from a consistent, in-memory snapshot; lookups never
/// block. Returned routes must be in precedence order.
pub trait RouteLookup {
    /// Finds a single HTTPRoute.
    fn fetch_by_name(&self, namespace: &str, name: &str) -> Option<Arc<HttpRoute>>;

    /// Finds every HTTPRoute in a namespace.
    fn fetch_by_namespace(&self, namespace: &str) -> Vec<Arc<HttpRoute>>;

    /// Finds HTTPRoutes carrying the delegation label with the given value,
    /// in one namespace or, when `namespace` is `None`, in all of them.
    fn fetch_by_selector(&self, namespace: Option<&str>, label: &str) -> Vec<Arc<HttpRoute>>;
}

/// Resolves namespace labels for listener namespace selectors.
pub trait NamespaceLookup {
    fn namespace_labels(&self, namespace: &str) -> Option<Labels>;
}
