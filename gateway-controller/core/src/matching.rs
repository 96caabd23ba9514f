//! Reconciles a delegated child's matches with the parent match that
//! delegated to it.
//!
//! By default a child match must be at least as specific as its parent's
//! (strict subset). A child that opts in to matcher inheritance instead
//! extends the parent match and is never rejected.

use crate::{
    http_route::{HeaderMatch, HttpRouteMatch, PathMatch, QueryParamMatch},
    routes::HttpRouteRule,
};
use std::collections::BTreeMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchMode {
    StrictSubset,
    InheritParent,
}

impl MatchMode {
    pub fn from_inherit(inherit_parent_matcher: bool) -> Self {
        if inherit_parent_matcher {
            Self::InheritParent
        } else {
            Self::StrictSubset
        }
    }
}

/// Returns the matches of `rule` that apply under `parent`, each paired with
/// its index in the child rule.
///
/// An empty result means the rule is dropped.
pub fn child_rule_matches(
    mode: MatchMode,
    parent: &HttpRouteMatch,
    rule: &HttpRouteRule,
) -> Vec<(usize, HttpRouteMatch)> {
    match mode {
        MatchMode::StrictSubset => rule
            .matches_or_default()
            .into_iter()
            .enumerate()
            .filter(|(_, child)| is_subset_match(parent, child))
            .collect(),
        MatchMode::InheritParent if rule.matches.is_empty() => vec![(0, parent.clone())],
        MatchMode::InheritParent => rule
            .matches
            .iter()
            .enumerate()
            .map(|(idx, child)| (idx, merge_matches(parent, child)))
            .collect(),
    }
}

/// Returns true if `child` is at least as specific as `parent`.
///
/// The parent path must be a `PathPrefix` that prefixes the child's path;
/// every parent header and query parameter matcher must appear verbatim in the
/// child; and a parent method must be repeated by the child.
pub fn is_subset_match(parent: &HttpRouteMatch, child: &HttpRouteMatch) -> bool {
    let prefix = match parent.path_or_default() {
        PathMatch::Prefix(prefix) => prefix,
        _ => return false,
    };
    if !child.path_or_default().value().starts_with(&prefix) {
        return false;
    }

    if !parent.headers.iter().all(|h| child.headers.contains(h)) {
        return false;
    }

    if !parent
        .query_params
        .iter()
        .all(|q| child.query_params.contains(q))
    {
        return false;
    }

    match parent.method.as_ref() {
        Some(method) => child.method.as_ref() == Some(method),
        None => true,
    }
}

/// Extends `parent` with `child`.
///
/// Paths are joined; headers and query parameters are unioned by name with
/// the parent's matcher winning conflicts, ordered by name; the parent's
/// method, when set, replaces the child's.
pub fn merge_matches(parent: &HttpRouteMatch, child: &HttpRouteMatch) -> HttpRouteMatch {
    let parent_path = parent.path_or_default();
    let path = match child.path.as_ref() {
        None => PathMatch::Prefix(join_paths(parent_path.value(), "")),
        Some(PathMatch::Exact(value)) => PathMatch::Exact(join_paths(parent_path.value(), value)),
        Some(PathMatch::Prefix(value)) => PathMatch::Prefix(join_paths(parent_path.value(), value)),
        Some(PathMatch::Regex(re)) => join_regex(parent_path.value(), re),
    };

    let mut headers = BTreeMap::<String, HeaderMatch>::new();
    for h in child.headers.iter().chain(parent.headers.iter()) {
        headers.insert(h.name().as_str().to_string(), h.clone());
    }

    let mut query_params = BTreeMap::<String, QueryParamMatch>::new();
    for q in child.query_params.iter().chain(parent.query_params.iter()) {
        query_params.insert(q.name().to_string(), q.clone());
    }

    HttpRouteMatch {
        path: Some(path),
        headers: headers.into_values().collect(),
        query_params: query_params.into_values().collect(),
        method: parent.method.clone().or_else(|| child.method.clone()),
    }
}

/// Joins two absolute paths, collapsing the slashes between them.
pub fn join_paths(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let child = child.trim_matches('/');
    match (parent.is_empty(), child.is_empty()) {
        (true, true) => "/".to_string(),
        (false, true) => parent.to_string(),
        (true, false) => format!("/{child}"),
        (false, false) => format!("{parent}/{child}"),
    }
}

fn join_regex(parent: &str, child: &regex::Regex) -> PathMatch {
    let parent = parent.trim_end_matches('/');
    let pattern = format!(
        "{}{}",
        regex::escape(parent),
        child.as_str().trim_start_matches('^')
    );
    match PathMatch::regex(&pattern) {
        Ok(path) => path,
        Err(error) => {
            tracing::warn!(
                %error,
                %pattern,
                "Failed to join regular expression path; using the child's"
            );
            PathMatch::Regex(child.clone())
        }
    }
}
