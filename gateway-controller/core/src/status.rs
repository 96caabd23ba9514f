use crate::{
    routes::{GroupKindNamespaceName, ParentReference},
    RouteErrorReason,
};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionType {
    Accepted,
    ResolvedRefs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConditionReason {
    Accepted,
    NotAllowedByListeners,
    NoMatchingParent,
    NoMatchingListenerHostname,
    UnsupportedValue,
    ResolvedRefs,
    BackendNotFound,
    RefNotPermitted,
    InvalidKind,
}

/// A condition value for a route's status against one parent. Persisting
/// it is left to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteCondition {
    pub route: GroupKindNamespaceName,
    pub parent_ref: ParentReference,
    pub type_: ConditionType,
    pub status: bool,
    pub reason: ConditionReason,
    pub message: String,
}

// === impl RouteCondition ===

impl RouteCondition {
    pub fn accepted(route: GroupKindNamespaceName, parent_ref: ParentReference) -> Self {
        Self {
            route,
            parent_ref,
            type_: ConditionType::Accepted,
            status: true,
            reason: ConditionReason::Accepted,
            message: String::new(),
        }
    }

    pub fn unsupported_value(
        route: GroupKindNamespaceName,
        parent_ref: ParentReference,
        message: impl ToString,
    ) -> Self {
        Self {
            route,
            parent_ref,
            type_: ConditionType::Accepted,
            status: false,
            reason: ConditionReason::UnsupportedValue,
            message: message.to_string(),
        }
    }

    pub fn from_error(
        route: GroupKindNamespaceName,
        parent_ref: ParentReference,
        error: &RouteErrorReason,
    ) -> Self {
        let (type_, reason) = match error {
            RouteErrorReason::NotAllowedByListeners => {
                (ConditionType::Accepted, ConditionReason::NotAllowedByListeners)
            }
            RouteErrorReason::NoMatchingParent => {
                (ConditionType::Accepted, ConditionReason::NoMatchingParent)
            }
            RouteErrorReason::NoMatchingListenerHostname => (
                ConditionType::Accepted,
                ConditionReason::NoMatchingListenerHostname,
            ),
            RouteErrorReason::UnresolvedReference => {
                (ConditionType::ResolvedRefs, ConditionReason::BackendNotFound)
            }
            RouteErrorReason::CyclicReference
            | RouteErrorReason::DelegationDepthExceeded(_)
            | RouteErrorReason::DelegationTreeTooLarge(_) => {
                (ConditionType::ResolvedRefs, ConditionReason::RefNotPermitted)
            }
            RouteErrorReason::LocalObjRefMissingKind => {
                (ConditionType::ResolvedRefs, ConditionReason::InvalidKind)
            }
        };
        Self {
            route,
            parent_ref,
            type_,
            status: false,
            reason,
            message: error.to_string(),
        }
    }
}

// === impl ConditionType ===

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accepted => "Accepted",
            Self::ResolvedRefs => "ResolvedRefs",
        })
    }
}

// === impl ConditionReason ===

impl fmt::Display for ConditionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
