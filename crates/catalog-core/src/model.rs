//! Data shapes served by the book catalog API.
//!
//! These types mirror the schema the HTTP client is generated from.  The
//! server owns the schema; this module only re-states it in Rust and applies
//! the same normalisation the server applies, so a `Book` built locally (in a
//! fixture or a test) looks exactly like one that came over the wire.
//!
//! # Normalisation rules
//!
//! | Field                 | Rule                                                      |
//! |-----------------------|-----------------------------------------------------------|
//! | `Ref::name`           | `main` becomes `refs/heads/main`; `refs/...` is kept       |
//! | `Ref::subdomain_name` | defaults to the bare ref name, then DNS-label sanitised    |
//! | `Repo::refs`          | a single ref or a list; each a bare name or an object      |
//! | `Book::name_registry` | defaults to `name` if it contains `/`, else `library/name` |
//!
//! Decoding never rejects a value the server accepted: a server-side `Ref`
//! whose subdomain sanitises to nothing, or a `Book` with an empty name, is
//! kept as is.  One odd entry must not fail the whole book list.  The
//! constructors ([`Ref::new`], [`Book::new`]) are stricter and refuse such
//! values when they are built locally.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest allowed DNS label.
pub const MAX_SUBDOMAIN_LEN: usize = 63;

const HEADS_PREFIX: &str = "refs/heads/";

/// Errors raised when a model value cannot be normalised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("ref name must not be empty")]
    EmptyRefName,

    /// Sanitising the subdomain removed every character (e.g. `"___"`).
    #[error("ref {0:?} does not yield a usable subdomain name")]
    EmptySubdomain(String),

    #[error("book name must not be empty")]
    EmptyBookName,
}

// ── Ref ───────────────────────────────────────────────────────────────────────

/// A tracked git ref and the subdomain its preview is served under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RefRepr")]
pub struct Ref {
    /// Full ref name, e.g. `refs/heads/main`.
    pub name: String,
    /// DNS-safe label; also used as the image tag.
    pub subdomain_name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RefRepr {
    Bare(String),
    Full {
        name: String,
        #[serde(default)]
        subdomain_name: Option<String>,
    },
}

impl From<RefRepr> for Ref {
    fn from(repr: RefRepr) -> Self {
        match repr {
            RefRepr::Bare(name) => Ref::normalise(&name, None),
            RefRepr::Full {
                name,
                subdomain_name,
            } => Ref::normalise(&name, subdomain_name.as_deref()),
        }
    }
}

impl Ref {
    /// Builds a ref whose subdomain is derived from its name.
    ///
    /// # Errors
    ///
    /// See [`Ref::with_subdomain`].
    pub fn new(name: &str) -> Result<Self, ModelError> {
        Self::with_subdomain(name, None)
    }

    /// Builds a ref with an explicit subdomain (sanitised all the same).
    ///
    /// The subdomain is derived from the name as written, before the
    /// `refs/heads/` prefix is added, so `main` maps to `main` while
    /// `refs/tags/v1.2` maps to `refs-tags-v1-2`.
    ///
    /// # Errors
    ///
    /// [`ModelError::EmptyRefName`] for a blank name and
    /// [`ModelError::EmptySubdomain`] when sanitising leaves nothing.
    pub fn with_subdomain(name: &str, subdomain: Option<&str>) -> Result<Self, ModelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyRefName);
        }
        let r = Self::normalise(name, subdomain);
        if r.subdomain_name.is_empty() {
            return Err(ModelError::EmptySubdomain(name.to_string()));
        }
        Ok(r)
    }

    /// Applies the normalisation rules without rejecting anything.
    fn normalise(name: &str, subdomain: Option<&str>) -> Self {
        let raw_subdomain = match subdomain {
            Some(s) if !s.is_empty() => s,
            _ => name,
        };
        let name = if name.starts_with("refs/") {
            name.to_string()
        } else {
            format!("{HEADS_PREFIX}{name}")
        };
        Self {
            name,
            subdomain_name: sanitize_subdomain(raw_subdomain),
        }
    }

    /// The branch name for `refs/heads/*` refs.
    pub fn branch(&self) -> Option<&str> {
        self.name.strip_prefix(HEADS_PREFIX)
    }
}

/// Lowercases `raw`, replaces every char outside `[a-z0-9-]` with `-`,
/// collapses dash runs, truncates to 63 chars, and trims edge dashes.
pub fn sanitize_subdomain(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    let truncated: String = out.chars().take(MAX_SUBDOMAIN_LEN).collect();
    truncated.trim_matches('-').to_string()
}

// ── Repo ──────────────────────────────────────────────────────────────────────

/// A git repository belonging to a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    #[serde(default = "default_repo_url")]
    pub url: String,
    #[serde(default = "default_refs", deserialize_with = "one_or_many_refs")]
    pub refs: Vec<Ref>,
}

impl Repo {
    /// A repository tracking only `main`.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            refs: default_refs(),
        }
    }
}

fn default_repo_url() -> String {
    "https://github.com/username/repo.git".to_string()
}

fn default_refs() -> Vec<Ref> {
    vec![Ref {
        name: format!("{HEADS_PREFIX}main"),
        subdomain_name: "main".to_string(),
    }]
}

fn one_or_many_refs<'de, D>(deserializer: D) -> Result<Vec<Ref>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Ref>),
        One(Ref),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(refs) => refs,
        OneOrMany::One(r) => vec![r],
    })
}

// ── Book ──────────────────────────────────────────────────────────────────────

/// Reverse-proxy routing settings for a book's previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraefikConfig {
    #[serde(default = "default_base_domain")]
    pub base_domain: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cert_resolver")]
    pub cert_resolver: String,
}

impl Default for TraefikConfig {
    fn default() -> Self {
        Self {
            base_domain: default_base_domain(),
            port: default_port(),
            cert_resolver: default_cert_resolver(),
        }
    }
}

fn default_base_domain() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    80
}
fn default_cert_resolver() -> String {
    "myresolver".to_string()
}

/// A deployable project: its repositories, docker contexts and routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BookRepr")]
pub struct Book {
    pub name: String,
    /// Image repository name, `NAMESPACE/REPOSITORY`.
    pub name_registry: String,
    pub repos: Vec<Repo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_file: Option<PathBuf>,
    /// Docker context used to build images.
    pub builder: String,
    /// Docker context used to run containers.
    pub runner: String,
    pub traefik_config: Option<TraefikConfig>,
    pub custom_labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_network: Option<String>,
}

#[derive(Deserialize)]
struct BookRepr {
    name: String,
    #[serde(default)]
    name_registry: String,
    #[serde(default = "default_repos")]
    repos: Vec<Repo>,
    #[serde(default)]
    docker_file: Option<PathBuf>,
    #[serde(default = "default_context")]
    builder: String,
    #[serde(default = "default_context")]
    runner: String,
    #[serde(default = "default_traefik")]
    traefik_config: Option<TraefikConfig>,
    #[serde(default)]
    custom_labels: Vec<String>,
    #[serde(default)]
    docker_network: Option<String>,
}

impl From<BookRepr> for Book {
    fn from(repr: BookRepr) -> Self {
        let name_registry = if repr.name_registry.is_empty() {
            default_name_registry(&repr.name)
        } else {
            repr.name_registry
        };
        Self {
            name: repr.name,
            name_registry,
            repos: repr.repos,
            docker_file: repr.docker_file,
            builder: repr.builder,
            runner: repr.runner,
            traefik_config: repr.traefik_config,
            custom_labels: repr.custom_labels,
            docker_network: repr.docker_network,
        }
    }
}

fn default_repos() -> Vec<Repo> {
    vec![Repo::new("main", default_repo_url())]
}
fn default_context() -> String {
    "default".to_string()
}
fn default_traefik() -> Option<TraefikConfig> {
    Some(TraefikConfig::default())
}

fn default_name_registry(name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("library/{name}")
    }
}

impl Book {
    /// A book with every optional field at its default.
    ///
    /// # Errors
    ///
    /// [`ModelError::EmptyBookName`] for a blank name.
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyBookName);
        }
        Ok(BookRepr {
            name,
            name_registry: String::new(),
            repos: default_repos(),
            docker_file: None,
            builder: default_context(),
            runner: default_context(),
            traefik_config: default_traefik(),
            custom_labels: Vec::new(),
            docker_network: None,
        }
        .into())
    }

    /// Replaces the repositories, keeping the rest of the book as is.
    pub fn with_repos(mut self, repos: Vec<Repo>) -> Self {
        self.repos = repos;
        self
    }

    /// Every `(repo, ref)` pair this book tracks, in declaration order.
    pub fn tracked_refs(&self) -> impl Iterator<Item = (&Repo, &Ref)> {
        self.repos
            .iter()
            .flat_map(|repo| repo.refs.iter().map(move |r| (repo, r)))
    }

    /// Host name the preview of `r` is routed at, if routing is configured.
    ///
    /// `None` as well when the subdomain or the book name is empty, since no
    /// valid host can be formed from them.
    pub fn preview_host(&self, r: &Ref) -> Option<String> {
        if r.subdomain_name.is_empty() || self.name.is_empty() {
            return None;
        }
        self.traefik_config
            .as_ref()
            .map(|cfg| format!("{}.{}.{}", r.subdomain_name, self.name, cfg.base_domain))
    }
}

// ── Book state ────────────────────────────────────────────────────────────────

/// Deployment state of one tracked ref, as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefState {
    /// Commit the ref currently points at on the remote.
    #[serde(default)]
    pub git_hash: Option<String>,
    /// Image tags present in the registry for this ref.
    #[serde(default)]
    pub image_tags: Vec<String>,
    /// Identifier of the running preview container, if any.
    #[serde(default)]
    pub container: Option<String>,
}

impl RefState {
    pub fn is_running(&self) -> bool {
        self.container.is_some()
    }
}

/// Response of `GET /books/{book_name}/state`: repo name → ref name → state.
pub type GetBookStateResponse = BTreeMap<String, BTreeMap<String, RefState>>;

// ── Tests ─────────────────────────────────────────────────────────────────────
