use crate::{
    routes::{DelegateRef, ParentReference, Route},
    RouteErrorReason,
};
use ahash::AHashMap as HashMap;
use std::hash::Hash;

/// A node of a resolved delegation tree.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteInfo {
    pub route: Route,

    /// The Gateway or ListenerSet reference the root bound through or, for a
    /// delegated child, the HTTPRoute that delegated to it.
    pub parent_ref: ParentReference,

    /// Hostnames computed by listener intersection. Delegated children carry
    /// their root's hostnames.
    pub hostname_overrides: Option<Vec<String>>,

    /// Resolved children of each delegate reference. May be empty.
    pub children: ReferenceResultMap<DelegateRef, RouteInfo>,
}

/// Maps references to the values they resolved to, tracking an error per
/// reference so that one bad reference does not fail its siblings.
///
/// A reference may carry values and an error at once: a wildcard that
/// resolves two children and skips a cyclic third keeps both.
#[derive(Clone, Debug)]
pub struct ReferenceResultMap<K, V> {
    entries: HashMap<K, ReferenceResult<V>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceResult<V> {
    pub values: Vec<V>,
    pub error: Option<RouteErrorReason>,
}

// === impl RouteInfo ===

impl RouteInfo {
    pub fn new(route: Route, parent_ref: ParentReference) -> Self {
        Self {
            route,
            parent_ref,
            hostname_overrides: None,
            children: ReferenceResultMap::default(),
        }
    }

    /// The hostnames this node is served at.
    pub fn hostnames(&self) -> Vec<String> {
        self.hostname_overrides
            .clone()
            .unwrap_or_else(|| self.route.hostnames().to_vec())
    }
}

// === impl ReferenceResultMap ===

impl<K, V> Default for ReferenceResultMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq, V> ReferenceResultMap<K, V> {
    /// Ensures an entry exists for `key`, even if nothing resolves.
    pub fn touch(&mut self, key: K) {
        self.entries.entry(key).or_default();
    }

    pub fn push(&mut self, key: K, value: V) {
        self.entries.entry(key).or_default().values.push(value);
    }

    /// Records an error for `key`. The first error recorded is kept.
    pub fn set_error(&mut self, key: K, error: RouteErrorReason) {
        let entry = self.entries.entry(key).or_default();
        if entry.error.is_none() {
            entry.error = Some(error);
        }
    }

    pub fn get(&self, key: &K) -> Option<&ReferenceResult<V>> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for ReferenceResultMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        *self.entries == *other.entries
    }
}

// === impl ReferenceResult ===

impl<V> Default for ReferenceResult<V> {
    fn default() -> Self {
        Self {
            values: vec![],
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_values_and_first_error() {
        let mut map = ReferenceResultMap::<&str, u32>::default();
        map.push("a", 1);
        map.push("a", 2);
        map.set_error("a", RouteErrorReason::CyclicReference);
        map.set_error("a", RouteErrorReason::UnresolvedReference);
        map.touch("b");

        let a = map.get(&"a").unwrap();
        assert_eq!(a.values, vec![1, 2]);
        assert_eq!(a.error, Some(RouteErrorReason::CyclicReference));

        let b = map.get(&"b").unwrap();
        assert!(b.values.is_empty());
        assert_eq!(b.error, None);
        assert_eq!(map.len(), 2);
        assert!(!map.contains_key(&"c"));
    }
}
