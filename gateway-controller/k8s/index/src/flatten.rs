use linkerd_gateway_controller_core::{
    http_route::HttpRouteMatch,
    matching::{child_rule_matches, MatchMode},
    routes::{Backend, DelegateRef, GroupKindNamespaceName, HttpRoute, HttpRouteRule, Route},
    status::RouteCondition,
    ReferenceResultMap, RouteErrorReason, RouteInfo,
};

/// One concrete rule match of a bound route tree.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatRoute {
    /// Unique within the tree and stable across passes.
    pub name: String,

    /// The route whose rule produced this entry.
    pub source: GroupKindNamespaceName,
    pub rule_name: Option<String>,
    pub hostnames: Vec<String>,
    pub route_match: HttpRouteMatch,
    pub backends: Vec<Backend>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Flattened {
    pub routes: Vec<FlatRoute>,
    pub conditions: Vec<RouteCondition>,
}

/// Walks a resolved delegation tree, replacing each delegate backend with
/// the rules of the children it resolved to.
#[derive(Debug, Default)]
pub struct TreeFlattener {
    out: Flattened,
    visited: Vec<GroupKindNamespaceName>,
}

// === impl TreeFlattener ===

impl TreeFlattener {
    /// Flattens the tree rooted at `root`. Trees rooted at anything other
    /// than an HTTPRoute produce nothing.
    pub fn flatten(root: &RouteInfo) -> Flattened {
        let mut flattener = Self::default();
        if let Route::Http(route) = &root.route {
            let hostnames = root.hostnames();
            flattener.visited.push(route.gknn());
            for (rule_idx, rule) in route.rules.iter().enumerate() {
                for (match_idx, route_match) in rule.matches_or_default().into_iter().enumerate() {
                    let name = entry_name(route, rule_idx, match_idx, rule);
                    flattener.rule(route, &root.children, rule, name, &route_match, &hostnames);
                }
            }
            flattener.visited.pop();
            flattener.report_slots(route, root, &root.children);
        }
        flattener.out
    }

    /// Emits `rule` under `route_match`: its concrete backends first, then
    /// each delegate's children in order. A child reached through more than
    /// one of the rule's delegates is emitted once, under the first.
    fn rule(
        &mut self,
        route: &HttpRoute,
        children: &ReferenceResultMap<DelegateRef, RouteInfo>,
        rule: &HttpRouteRule,
        name: String,
        route_match: &HttpRouteMatch,
        hostnames: &[String],
    ) {
        let backends = rule.concrete_backends().cloned().collect::<Vec<_>>();
        if !backends.is_empty() || !rule.has_delegates() {
            self.out.routes.push(FlatRoute {
                name: name.clone(),
                source: route.gknn(),
                rule_name: rule.name.clone(),
                hostnames: hostnames.to_vec(),
                route_match: route_match.clone(),
                backends,
            });
        }

        let mut emitted = Vec::<GroupKindNamespaceName>::new();
        for delegate in rule.delegates() {
            let Some(slot) = children.get(delegate) else {
                continue;
            };
            for child in &slot.values {
                let id = child.route.gknn();
                if emitted.contains(&id) {
                    tracing::debug!(route = %id, %delegate, "Child already delegated by this rule");
                    continue;
                }
                emitted.push(id);
                self.child(child, &name, route_match, hostnames);
            }
        }
    }

    fn child(
        &mut self,
        child: &RouteInfo,
        parent_name: &str,
        parent_match: &HttpRouteMatch,
        hostnames: &[String],
    ) {
        let Route::Http(route) = &child.route else {
            return;
        };
        let id = route.gknn();

        if self.visited.contains(&id) {
            tracing::warn!(route = %id, "Delegation tree contains a cycle");
            self.out.conditions.push(RouteCondition::from_error(
                id,
                child.parent_ref.clone(),
                &RouteErrorReason::CyclicReference,
            ));
            return;
        }

        if !route.hostnames.is_empty() {
            tracing::debug!(route = %id, "Delegated route declares hostnames");
            self.out.conditions.push(RouteCondition::unsupported_value(
                id,
                child.parent_ref.clone(),
                "delegated routes must not declare hostnames",
            ));
            return;
        }

        let mode = MatchMode::from_inherit(route.inherit_parent_matcher);
        let produced_before = self.out.routes.len();

        self.visited.push(id.clone());
        for (rule_idx, rule) in route.rules.iter().enumerate() {
            for (match_idx, route_match) in child_rule_matches(mode, parent_match, rule) {
                let name = format!(
                    "{parent_name}.{}",
                    entry_name(route, rule_idx, match_idx, rule)
                );
                self.rule(route, &child.children, rule, name, &route_match, hostnames);
            }
        }
        self.visited.pop();

        if self.out.routes.len() > produced_before {
            self.out
                .conditions
                .push(RouteCondition::accepted(id, child.parent_ref.clone()));
        } else {
            tracing::debug!(route = %id, "Delegated route has no rules within its parent's match");
        }
        self.report_slots(route, child, &child.children);
    }

    /// Records a condition for each delegate slot of `route` that failed,
    /// in rule order.
    fn report_slots(
        &mut self,
        route: &HttpRoute,
        node: &RouteInfo,
        children: &ReferenceResultMap<DelegateRef, RouteInfo>,
    ) {
        let mut reported = Vec::<&DelegateRef>::new();
        for delegate in route.rules.iter().flat_map(|rule| rule.delegates()) {
            if reported.contains(&delegate) {
                continue;
            }
            reported.push(delegate);

            let error = children.get(delegate).and_then(|slot| slot.error.as_ref());
            if let Some(error) = error {
                self.out.conditions.push(RouteCondition::from_error(
                    route.gknn(),
                    node.parent_ref.clone(),
                    error,
                ));
            }
        }
    }
}

/// `{kind}-{namespace}-{name}-{rule}-{match}`, suffixed with the rule's name
/// when it has one.
fn entry_name(
    route: &HttpRoute,
    rule_idx: usize,
    match_idx: usize,
    rule: &HttpRouteRule,
) -> String {
    let id = route.gknn();
    let mut name = format!(
        "{}-{}-{}-{rule_idx}-{match_idx}",
        id.kind.to_ascii_lowercase(),
        id.namespace,
        id.name
    );
    if let Some(rule_name) = rule.name.as_deref() {
        name.push('-');
        name.push_str(rule_name);
    }
    name
}
