//! Linkerd Gateway Controller Index
//!
//! Resolves which routes attach to which Gateway listeners and expands HTTP
//! route delegation into flat, per-listener routing tables. A pass reads one
//! immutable [`Snapshot`]:
//!
//! - Each `Gateway`, and each `XListenerSet` its Gateway admits, declares
//!   listeners.
//! - Each route references the Gateways or ListenerSets it attaches to. The
//!   [`ListenerBinder`] checks kinds, namespaces, ports, section names and
//!   hostnames, binding the route to every listener that accepts it.
//! - An `HTTPRoute` rule may delegate to other HTTPRoutes by name, by
//!   namespace wildcard, or by label. The [`DelegationResolver`] expands
//!   these into a tree, and the [`TreeFlattener`] walks the tree to produce
//!   concrete rule matches.
//!
//! ```text
//! [ Gateway/ListenerSet ] -> [ Listener ] <- [ Route ] -> [ delegated HTTPRoutes ... ]
//! ```
//!
//! No error aborts a pass. Failures are scoped to a listener, a parent
//! reference or a delegate reference and are returned as data.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod binder;
mod config;
mod delegation;
mod flatten;
pub mod gateway;
pub mod routes;
mod snapshot;


pub use self::{
    binder::{Bindings, ListenerBinder, ListenerResult},
    config::{Config, DEFAULT_MAX_DELEGATION_DEPTH},
    delegation::{DelegationResolver, DEFAULT_MAX_DELEGATION_NODES},
    flatten::{FlatRoute, Flattened, TreeFlattener},
    snapshot::Snapshot,
};
use linkerd_gateway_controller_core::{
    routes::GroupKindNamespaceName, status::RouteCondition, RouteError,
};

/// The output of one resolution pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    pub listeners: Vec<ListenerResult>,
    pub route_errors: Vec<RouteError>,

    /// Flattened HTTP routes, per listener, in listener order.
    pub flattened: Vec<ListenerRoutes>,

    /// Status outcomes for every route the pass touched.
    pub conditions: Vec<RouteCondition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListenerRoutes {
    pub parent: GroupKindNamespaceName,
    pub listener: String,
    pub routes: Vec<FlatRoute>,
}

/// Runs one resolution pass over `snapshot`.
pub fn resolve(snapshot: &Snapshot, config: &Config) -> Resolution {
    let binder = ListenerBinder::new(snapshot, config.max_delegation_depth)
        .with_max_delegation_nodes(config.max_delegation_nodes);
    let Bindings {
        listeners,
        route_errors,
    } = binder.bind(
        snapshot.gateways(),
        snapshot.listener_sets(),
        snapshot.routes(),
    );

    let mut conditions = route_errors
        .iter()
        .map(|e| RouteCondition::from_error(e.route.clone(), e.parent_ref.clone(), &e.reason))
        .collect::<Vec<_>>();

    let mut flattened = Vec::with_capacity(listeners.len());
    for listener in &listeners {
        let Ok(roots) = listener.result.as_ref() else {
            continue;
        };

        let mut routes = Vec::new();
        for root in roots {
            conditions.push(RouteCondition::accepted(
                root.route.gknn(),
                root.parent_ref.clone(),
            ));
            let Flattened {
                routes: flat,
                conditions: flat_conditions,
            } = TreeFlattener::flatten(root);
            routes.extend(flat);
            conditions.extend(flat_conditions);
        }

        flattened.push(ListenerRoutes {
            parent: listener.parent.clone(),
            listener: listener.listener.clone(),
            routes,
        });
    }

    tracing::info!(
        listeners = listeners.len(),
        errors = route_errors.len(),
        routes = flattened.iter().map(|l| l.routes.len()).sum::<usize>(),
        "Resolved routes"
    );

    Resolution {
        listeners,
        route_errors,
        flattened,
        conditions,
    }
}
