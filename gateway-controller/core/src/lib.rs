//! Core model for Gateway API route attachment and delegation.
//!
//! Everything here is pure: resources arrive already converted into typed
//! values, and lookups go through the [`RouteLookup`] and
//! [`NamespaceLookup`] traits.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod attach;
mod error;
pub mod gateway;
pub mod hostname;
pub mod http_route;
pub mod labels;
mod lookup;
pub mod matching;
pub mod routes;
pub mod status;
mod tree;

pub use self::{
    error::{ListenerError, RouteError, RouteErrorReason},
    lookup::{NamespaceLookup, RouteLookup},
    routes::{ALL_NAMESPACES, DELEGATION_LABEL, DELEGATION_LABEL_GROUP, DELEGATION_LABEL_KIND},
    tree::{ReferenceResult, ReferenceResultMap, RouteInfo},
};

pub const GATEWAY_CONTROLLER_NAME: &str = "linkerd.io/gateway-controller";
