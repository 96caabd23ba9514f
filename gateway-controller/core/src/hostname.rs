/// Computes the hostnames at which a listener and a route agree.
///
/// Returns `None` when they do not intersect. An empty result means the
/// route matches every hostname.
pub fn intersect(
    listener_hostname: Option<&str>,
    route_hostnames: &[String],
) -> Option<Vec<String>> {
    let listener_hostname = match listener_hostname {
        None => return Some(route_hostnames.to_vec()),
        Some(h) => h,
    };

    if route_hostnames.is_empty() {
        return Some(vec![listener_hostname.to_string()]);
    }

    let matched = if let Some(suffix) = wildcard_suffix(listener_hostname) {
        route_hostnames
            .iter()
            .filter(|hostname| hostname.ends_with(suffix))
            .cloned()
            .collect::<Vec<_>>()
    } else {
        let any = route_hostnames.iter().any(|hostname| {
            hostname == listener_hostname
                || wildcard_suffix(hostname)
                    .map(|suffix| listener_hostname.ends_with(suffix))
                    .unwrap_or(false)
        });
        if any {
            vec![listener_hostname.to_string()]
        } else {
            vec![]
        }
    };

    if matched.is_empty() {
        return None;
    }
    Some(matched)
}

/// Returns the `.domain` suffix of a `*.domain` hostname.
fn wildcard_suffix(hostname: &str) -> Option<&str> {
    hostname.strip_prefix('*').filter(|s| s.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(hosts: &[&str]) -> Vec<String> {
        hosts.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn unset_listener_matches_route_hostnames() {
        assert_eq!(intersect(None, &names(&["a.com"])), Some(names(&["a.com"])));
        assert_eq!(intersect(None, &[]), Some(vec![]));
    }

    #[test]
    fn wildcard_listener_keeps_suffix_matches() {
        assert_eq!(
            intersect(Some("*.foo.com"), &names(&["bar.foo.com", "blah.com"])),
            Some(names(&["bar.foo.com"]))
        );
        assert_eq!(
            intersect(Some("*.foo.com"), &[]),
            Some(names(&["*.foo.com"]))
        );
        assert_eq!(intersect(Some("*.foo.com"), &names(&["blah.com"])), None);
    }

    #[test]
    fn exact_listener() {
        assert_eq!(intersect(Some("foo.com"), &[]), Some(names(&["foo.com"])));
        assert_eq!(
            intersect(Some("foo.com"), &names(&["bar.com", "foo.com"])),
            Some(names(&["foo.com"]))
        );
        assert_eq!(
            intersect(Some("a.foo.com"), &names(&["*.foo.com"])),
            Some(names(&["a.foo.com"]))
        );
        assert_eq!(intersect(Some("foo.com"), &names(&["bar.com"])), None);
    }
}
