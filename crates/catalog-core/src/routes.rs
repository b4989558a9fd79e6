//! Client-side route table.
//!
//! The catalog UI has two views:
//!
//! | Path           | Name    | View             | Loading |
//! |----------------|---------|------------------|---------|
//! | `/`            | `home`  | book list        | eager   |
//! | `/books/:name` | `books` | one book + state | lazy    |
//!
//! `:name` segments are path parameters, percent-encoded in hrefs and
//! decoded on resolution.  The table can be mounted under a
//! base path (the history base URL), in which case every resolved path must
//! start with it and every generated href is prefixed with it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::trace;

/// Errors raised while resolving paths or building hrefs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No route matches the path.
    #[error("no route matches path {0:?}")]
    NotFound(String),

    /// A route name string does not name any route.
    #[error("unknown route name {0:?}")]
    UnknownRoute(String),

    /// `href` was called without a parameter the pattern needs.
    #[error("route {route} requires parameter {param:?}")]
    MissingParam { route: RouteName, param: String },

    /// A parameter value cannot be placed into a single path segment.
    #[error("invalid value {value:?} for parameter {param:?}")]
    InvalidParam { param: String, value: String },
}

/// Names of the routes in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteName {
    Home,
    Books,
}

impl RouteName {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteName::Home => "home",
            RouteName::Books => "books",
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteName {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(RouteName::Home),
            "books" => Ok(RouteName::Books),
            other => Err(RouteError::UnknownRoute(other.to_string())),
        }
    }
}

/// Whether a view is bundled with the shell or fetched on first navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewLoading {
    Eager,
    Lazy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    name: RouteName,
    pattern: String,
    segments: Vec<Segment>,
    loading: ViewLoading,
}

impl Route {
    /// Builds a route from a `/static/:param` style pattern.
    pub fn new(name: RouteName, pattern: &str, loading: ViewLoading) -> Self {
        let segments = split_path(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(param) => Segment::Param(param.to_string()),
                None => Segment::Static(s.to_string()),
            })
            .collect();
        Self {
            name,
            pattern: pattern.to_string(),
            segments,
            loading,
        }
    }

    pub fn name(&self) -> RouteName {
        self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn loading(&self) -> ViewLoading {
        self.loading
    }

    /// Names of the path parameters, in pattern order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(p) => Some(p.as_str()),
            Segment::Static(_) => None,
        })
    }

    fn matches(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(s) if s == part => {}
                Segment::Static(_) => return None,
                Segment::Param(p) => {
                    let value = urlencoding::decode(part).ok()?;
                    params.insert(p.clone(), value.into_owned());
                }
            }
        }
        Some(params)
    }
}

/// Result of resolving a path against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub name: RouteName,
    pub loading: ViewLoading,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The `:name` parameter of the `books` route.
    pub fn book_name(&self) -> Option<&str> {
        match self.name {
            RouteName::Books => self.param("name"),
            RouteName::Home => None,
        }
    }
}

/// The application's routes, optionally mounted under a base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    base: String,
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::with_base("/")
    }
}

impl RouteTable {
    /// The catalog routes mounted at `base` (e.g. `/` or `/catalog/`).
    pub fn with_base(base: &str) -> Self {
        let base = split_path(base).collect::<Vec<_>>().join("/");
        let base = if base.is_empty() {
            String::new()
        } else {
            format!("/{base}")
        };
        Self {
            base,
            routes: vec![
                Route::new(RouteName::Home, "/", ViewLoading::Eager),
                Route::new(RouteName::Books, "/books/:name", ViewLoading::Lazy),
            ],
        }
    }

    /// Base path without a trailing slash; empty when mounted at `/`.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, name: RouteName) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Resolves a location (path, optionally with query and fragment).
    ///
    /// Query string and fragment are ignored; a trailing slash is tolerated.
    /// Parameter values are percent-decoded after the path is split, so
    /// `/books/my%20book` yields `my book` and `%2F` never splits a segment.
    /// A parameter that does not decode to UTF-8 does not match.
    ///
    /// # Errors
    ///
    /// [`RouteError::NotFound`] when the path is outside the base path or no
    /// route pattern matches it.
    pub fn resolve(&self, location: &str) -> Result<RouteMatch, RouteError> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let not_found = || RouteError::NotFound(location.to_string());

        let relative = if self.base.is_empty() {
            path
        } else {
            let rest = path.strip_prefix(&self.base).ok_or_else(not_found)?;
            // "/catalogue" must not match base "/catalog"
            if !(rest.is_empty() || rest.starts_with('/')) {
                return Err(not_found());
            }
            rest
        };

        let parts: Vec<&str> = split_path(relative).collect();
        let found = self.routes.iter().find_map(|route| {
            route.matches(&parts).map(|params| RouteMatch {
                name: route.name,
                loading: route.loading,
                params,
            })
        });

        match found {
            Some(m) => {
                trace!(location, route = %m.name, "resolved route");
                Ok(m)
            }
            None => Err(not_found()),
        }
    }

    /// Builds the href of a named route, base path included.
    ///
    /// # Errors
    ///
    /// [`RouteError::MissingParam`] when `params` lacks a pattern parameter and
    /// [`RouteError::InvalidParam`] when a value is empty.
    ///
    /// Parameter values are percent-encoded, `/` included, so every value
    /// occupies exactly one path segment.
    pub fn href(
        &self,
        name: RouteName,
        params: &BTreeMap<String, String>,
    ) -> Result<String, RouteError> {
        let route = self
            .route(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;

        let mut out = self.base.clone();
        for segment in &route.segments {
            out.push('/');
            match segment {
                Segment::Static(s) => out.push_str(s),
                Segment::Param(p) => {
                    let value = params.get(p).ok_or_else(|| RouteError::MissingParam {
                        route: name,
                        param: p.clone(),
                    })?;
                    if value.is_empty() {
                        return Err(RouteError::InvalidParam {
                            param: p.clone(),
                            value: value.clone(),
                        });
                    }
                    out.push_str(&urlencoding::encode(value));
                }
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }

    /// Shorthand for the href of the `books` route.
    pub fn book_href(&self, book_name: &str) -> Result<String, RouteError> {
        let params = BTreeMap::from([("name".to_string(), book_name.to_string())]);
        self.href(RouteName::Books, &params)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
