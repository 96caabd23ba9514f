use crate::delegation::DEFAULT_MAX_DELEGATION_NODES;
use linkerd_gateway_controller_core::GATEWAY_CONTROLLER_NAME;

/// Bounds how deep delegation may nest before resolution fails closed.
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Written as the `controllerName` of each route parent status.
    pub controller_name: String,

    pub max_delegation_depth: usize,

    /// Bounds the number of delegated routes under each bound route.
    pub max_delegation_nodes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller_name: GATEWAY_CONTROLLER_NAME.to_string(),
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
            max_delegation_nodes: DEFAULT_MAX_DELEGATION_NODES,
        }
    }
}
