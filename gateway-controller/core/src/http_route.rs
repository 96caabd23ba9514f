use anyhow::Result;
pub use http::{
    header::{HeaderName, HeaderValue},
    Method,
};
use regex::Regex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRouteMatch {
    pub path: Option<PathMatch>,
    pub headers: Vec<HeaderMatch>,
    pub query_params: Vec<QueryParamMatch>,
    pub method: Option<Method>,
}

#[derive(Clone, Debug)]
pub enum PathMatch {
    Exact(String),
    Prefix(String),
    Regex(Regex),
}

#[derive(Clone, Debug)]
pub enum HeaderMatch {
    Exact(HeaderName, HeaderValue),
    Regex(HeaderName, Regex),
}

#[derive(Clone, Debug)]
pub enum QueryParamMatch {
    Exact(String, String),
    Regex(String, Regex),
}

// === impl HttpRouteMatch ===

/// Matches every request: a `PathPrefix` of `/`.
impl Default for HttpRouteMatch {
    fn default() -> Self {
        Self {
            path: Some(PathMatch::Prefix("/".to_string())),
            headers: vec![],
            query_params: vec![],
            method: None,
        }
    }
}

impl HttpRouteMatch {
    pub fn prefix(path: impl ToString) -> Self {
        Self {
            path: Some(PathMatch::Prefix(path.to_string())),
            ..Default::default()
        }
    }

    /// The effective path match; an absent path matches everything.
    pub fn path_or_default(&self) -> PathMatch {
        self.path
            .clone()
            .unwrap_or_else(|| PathMatch::Prefix("/".to_string()))
    }
}

// === impl PathMatch ===

impl PartialEq for PathMatch {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(l0), Self::Exact(r0)) => l0 == r0,
            (Self::Prefix(l0), Self::Prefix(r0)) => l0 == r0,
            (Self::Regex(l0), Self::Regex(r0)) => l0.as_str() == r0.as_str(),
            _ => false,
        }
    }
}

impl Eq for PathMatch {}

impl PathMatch {
    pub fn regex(s: &str) -> Result<Self> {
        Ok(Self::Regex(Regex::new(s)?))
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Exact(v) | Self::Prefix(v) => v,
            Self::Regex(re) => re.as_str(),
        }
    }
}

// === impl HeaderMatch ===

impl PartialEq for HeaderMatch {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(n0, v0), Self::Exact(n1, v1)) => n0 == n1 && v0 == v1,
            (Self::Regex(n0, r0), Self::Regex(n1, r1)) => n0 == n1 && r0.as_str() == r1.as_str(),
            _ => false,
        }
    }
}

impl Eq for HeaderMatch {}

impl HeaderMatch {
    pub fn name(&self) -> &HeaderName {
        match self {
            Self::Exact(name, _) | Self::Regex(name, _) => name,
        }
    }
}

// === impl QueryParamMatch ===

impl PartialEq for QueryParamMatch {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(n0, v0), Self::Exact(n1, v1)) => n0 == n1 && v0 == v1,
            (Self::Regex(n0, r0), Self::Regex(n1, r1)) => n0 == n1 && r0.as_str() == r1.as_str(),
            _ => false,
        }
    }
}

impl Eq for QueryParamMatch {}

impl QueryParamMatch {
    pub fn name(&self) -> &str {
        match self {
            Self::Exact(name, _) | Self::Regex(name, _) => name,
        }
    }
}
