//! Resolves an HTTPRoute's delegate references into a tree of child routes.
//!
//! Resolution is depth-first. The routes on the path from the root to the
//! node being resolved form the visited set: a route is pushed before its
//! children are resolved and popped afterwards, so a route reachable along
//! two distinct paths (a diamond) resolves under both, while a route that
//! would revisit one of its own ancestors is reported as a cycle.
//!
//! Diamonds mean a tree may hold many more nodes than there are routes, so
//! each tree is also bounded by a node budget. Once the budget is spent,
//! further children fail closed.

use ahash::AHashSet as HashSet;
use linkerd_gateway_controller_core::{
    attach::child_can_attach,
    routes::{
        DelegateRef, DelegateTarget, GroupKindNamespaceName, HttpRoute, ParentReference, Route,
    },
    ReferenceResultMap, RouteErrorReason, RouteInfo, RouteLookup,
};
use std::sync::Arc;

/// Bounds how many delegated routes one tree may hold.
pub const DEFAULT_MAX_DELEGATION_NODES: usize = 10_000;

#[derive(Debug)]
pub struct DelegationResolver<'a, L> {
    lookup: &'a L,
    max_depth: usize,
    max_nodes: usize,
}

/// The routes on the active resolution path.
#[derive(Debug, Default)]
struct Visited(HashSet<(String, String)>);

// === impl DelegationResolver ===

impl<'a, L: RouteLookup> DelegationResolver<'a, L> {
    pub fn new(lookup: &'a L, max_depth: usize) -> Self {
        Self {
            lookup,
            max_depth,
            max_nodes: DEFAULT_MAX_DELEGATION_NODES,
        }
    }

    /// Bounds the number of delegated routes in each tree.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Builds the delegation tree beneath `route`, bound through
    /// `parent_ref` at `hostnames`. Every node in the tree carries the same
    /// hostnames.
    pub fn resolve(
        &self,
        route: Arc<HttpRoute>,
        parent_ref: ParentReference,
        hostnames: Option<Vec<String>>,
    ) -> RouteInfo {
        let mut visited = Visited::default();
        let mut budget = self.max_nodes;
        visited.push(&route);
        let children = self.resolve_children(&route, &hostnames, &mut visited, &mut budget, 0);
        visited.pop(&route);

        RouteInfo {
            route: Route::Http(route),
            parent_ref,
            hostname_overrides: hostnames,
            children,
        }
    }

    fn resolve_children(
        &self,
        parent: &HttpRoute,
        hostnames: &Option<Vec<String>>,
        visited: &mut Visited,
        budget: &mut usize,
        depth: usize,
    ) -> ReferenceResultMap<DelegateRef, RouteInfo> {
        let mut children = ReferenceResultMap::default();
        let parent_id = parent.gknn();

        for delegate in parent.rules.iter().flat_map(|rule| rule.delegates()) {
            // A reference shared by several rules resolves once.
            if children.contains_key(delegate) {
                continue;
            }
            children.touch(delegate.clone());

            if depth >= self.max_depth {
                tracing::warn!(
                    parent = %parent_id,
                    %delegate,
                    max_depth = self.max_depth,
                    "Delegation is too deep"
                );
                children.set_error(
                    delegate.clone(),
                    RouteErrorReason::DelegationDepthExceeded(self.max_depth),
                );
                continue;
            }

            let candidates = match self.candidates(delegate) {
                Ok(candidates) => candidates,
                Err(error) => {
                    tracing::debug!(
                        parent = %parent_id,
                        %delegate,
                        %error,
                        "Delegate reference failed"
                    );
                    children.set_error(delegate.clone(), error);
                    continue;
                }
            };

            for candidate in candidates {
                let child_id = candidate.gknn();

                // An ancestor is a cycle even if it does not opt in to this
                // parent.
                if visited.contains(&candidate) {
                    tracing::debug!(parent = %parent_id, child = %child_id, "Cyclic delegation");
                    children.set_error(delegate.clone(), RouteErrorReason::CyclicReference);
                    continue;
                }

                let opted_in =
                    child_can_attach(&candidate.meta.namespace, &candidate.parent_refs, &parent_id);
                if !opted_in {
                    tracing::debug!(
                        parent = %parent_id,
                        child = %child_id,
                        "Route does not accept delegation from parent"
                    );
                    continue;
                }

                if *budget == 0 {
                    tracing::warn!(
                        parent = %parent_id,
                        child = %child_id,
                        max_nodes = self.max_nodes,
                        "Delegation tree is too large"
                    );
                    children.set_error(
                        delegate.clone(),
                        RouteErrorReason::DelegationTreeTooLarge(self.max_nodes),
                    );
                    break;
                }
                *budget -= 1;

                visited.push(&candidate);
                let grandchildren =
                    self.resolve_children(&candidate, hostnames, visited, budget, depth + 1);
                visited.pop(&candidate);

                children.push(
                    delegate.clone(),
                    RouteInfo {
                        route: Route::Http(candidate.clone()),
                        parent_ref: synthetic_parent_ref(&parent_id),
                        hostname_overrides: hostnames.clone(),
                        children: grandchildren,
                    },
                );
            }
        }

        children
    }

    /// Finds the routes a delegate reference names, in precedence order.
    fn candidates(&self, delegate: &DelegateRef) -> Result<Vec<Arc<HttpRoute>>, RouteErrorReason> {
        match delegate.target()? {
            DelegateTarget::Name { namespace, name } => self
                .lookup
                .fetch_by_name(namespace, name)
                .map(|route| vec![route])
                .ok_or(RouteErrorReason::UnresolvedReference),
            DelegateTarget::Wildcard { namespace } => Ok(self.lookup.fetch_by_namespace(namespace)),
            DelegateTarget::Selector { namespace, label } => {
                let routes = self.lookup.fetch_by_selector(namespace, label);
                if routes.is_empty() {
                    return Err(RouteErrorReason::UnresolvedReference);
                }
                Ok(routes)
            }
        }
    }
}

/// Delegated children report against the HTTPRoute that delegated to them.
fn synthetic_parent_ref(parent: &GroupKindNamespaceName) -> ParentReference {
    ParentReference::http_route(&parent.namespace, &parent.name)
}

// === impl Visited ===

impl Visited {
    fn key(route: &HttpRoute) -> (String, String) {
        (route.meta.namespace.clone(), route.meta.name.clone())
    }

    fn push(&mut self, route: &HttpRoute) {
        self.0.insert(Self::key(route));
    }

    fn pop(&mut self, route: &HttpRoute) {
        self.0.remove(&Self::key(route));
    }

    fn contains(&self, route: &HttpRoute) -> bool {
        self.0.contains(&Self::key(route))
    }
}
