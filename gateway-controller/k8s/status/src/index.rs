use chrono::{offset::Utc, DateTime};
use linkerd_gateway_controller_core::{
    routes::{GroupKindNamespaceName, ParentReference},
    status::{ConditionReason, ConditionType, RouteCondition},
};
use linkerd_gateway_controller_k8s_api as k8s;
use linkerd_gateway_controller_k8s_index::Resolution;
use serde::Serialize;
use std::collections::BTreeMap;

const GATEWAY_API_VERSION: &str = "gateway.networking.k8s.io/v1";

/// Route conditions, grouped by route and then by parent reference.
#[derive(Clone, Debug)]
pub struct Index {
    controller_name: String,
    routes: BTreeMap<GroupKindNamespaceName, BTreeMap<ParentReference, ParentConditions>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct ParentConditions {
    accepted: Option<Outcome>,
    resolved_refs: Option<Outcome>,
}

#[derive(Clone, Debug, PartialEq)]
struct Outcome {
    status: bool,
    reason: ConditionReason,
    message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteStatus {
    pub parents: Vec<RouteParentStatus>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteParentStatus {
    pub parent_ref: k8s::ParentReference,
    pub controller_name: String,
    pub conditions: Vec<k8s::Condition>,
}

/// The status of one route, ready to be patched onto it.
#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    pub id: GroupKindNamespaceName,
    pub status: RouteStatus,
}

// === impl Index ===

impl Index {
    pub fn new(controller_name: impl ToString) -> Self {
        Self {
            controller_name: controller_name.to_string(),
            routes: BTreeMap::new(),
        }
    }

    /// Records a condition. A `False` outcome is never replaced by a `True`
    /// outcome of the same type; the first `False` outcome wins.
    pub fn apply(&mut self, condition: RouteCondition) {
        let RouteCondition {
            route,
            parent_ref,
            type_,
            status,
            reason,
            message,
        } = condition;
        tracing::trace!(%route, ?parent_ref, %type_, status, %reason, "Applying condition");

        let conditions = self
            .routes
            .entry(route)
            .or_default()
            .entry(parent_ref)
            .or_default();
        let slot = match type_ {
            ConditionType::Accepted => &mut conditions.accepted,
            ConditionType::ResolvedRefs => &mut conditions.resolved_refs,
        };
        let keep = matches!(slot, Some(current) if !current.status || status);
        if !keep {
            *slot = Some(Outcome {
                status,
                reason,
                message,
            });
        }
    }

    pub fn extend(&mut self, conditions: impl IntoIterator<Item = RouteCondition>) {
        for condition in conditions {
            self.apply(condition);
        }
    }

    pub fn apply_resolution(&mut self, resolution: &Resolution) {
        self.extend(resolution.conditions.iter().cloned());
        tracing::debug!(routes = self.routes.len(), "Indexed route conditions");
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn statuses(&self) -> Vec<Update> {
        self.statuses_at(Utc::now())
    }

    /// Renders every indexed route's status, in route order, stamping each
    /// condition with `timestamp`.
    pub fn statuses_at(&self, timestamp: DateTime<Utc>) -> Vec<Update> {
        self.routes
            .iter()
            .map(|(id, parents)| {
                let parents = parents
                    .iter()
                    .map(|(parent_ref, conditions)| RouteParentStatus {
                        parent_ref: api_parent_ref(parent_ref),
                        controller_name: self.controller_name.clone(),
                        conditions: conditions.to_k8s(timestamp),
                    })
                    .collect();
                Update {
                    id: id.clone(),
                    status: RouteStatus { parents },
                }
            })
            .collect()
    }
}

// === impl ParentConditions ===

impl ParentConditions {
    /// An unreported `ResolvedRefs` condition means every reference resolved.
    fn to_k8s(&self, timestamp: DateTime<Utc>) -> Vec<k8s::Condition> {
        let resolved_refs = self.resolved_refs.clone().unwrap_or(Outcome {
            status: true,
            reason: ConditionReason::ResolvedRefs,
            message: String::new(),
        });

        self.accepted
            .iter()
            .map(|accepted| condition(ConditionType::Accepted, accepted, timestamp))
            .chain(Some(condition(
                ConditionType::ResolvedRefs,
                &resolved_refs,
                timestamp,
            )))
            .collect()
    }
}

// === impl Update ===

impl Update {
    pub fn patch(&self) -> serde_json::Value {
        make_patch(&self.id, &self.status)
    }
}

fn condition(type_: ConditionType, outcome: &Outcome, timestamp: DateTime<Utc>) -> k8s::Condition {
    k8s::Condition {
        last_transition_time: k8s::Time(timestamp),
        message: outcome.message.clone(),
        observed_generation: None,
        reason: outcome.reason.to_string(),
        status: if outcome.status { "True" } else { "False" }.to_string(),
        type_: type_.to_string(),
    }
}

fn api_parent_ref(parent_ref: &ParentReference) -> k8s::ParentReference {
    k8s::ParentReference {
        group: Some(parent_ref.group.to_string()),
        kind: Some(parent_ref.kind.to_string()),
        namespace: parent_ref.namespace.clone(),
        name: parent_ref.name.clone(),
        section_name: parent_ref.section_name.clone(),
        port: parent_ref.port.map(|port| i32::from(port.get())),
    }
}

/// A JSON merge patch setting a route's status.
pub fn make_patch(id: &GroupKindNamespaceName, status: &RouteStatus) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": GATEWAY_API_VERSION,
        "kind": id.kind,
        "name": id.name,
        "status": status,
    })
}
