//! Lifecycle of one asynchronously fetched value.
//!
//! A view never holds a bare `Vec<Book>` that "might not be there yet".  It
//! holds an [`AsyncState`] and branches on the variant:
//!
//! ```text
//! Initial ──fetch──►  Loading ──ok──►  Ready(value)
//!                        │
//!                        └──err─►  Error(detail)
//! ```
//!
//! Starting a new fetch from `Ready` or `Error` goes back to `Loading`.
//!
//! Because the payload lives inside the `Ready` variant and the error inside
//! the `Error` variant, "ready without a value" or "error without a detail"
//! cannot be constructed.
//!
//! # Snapshots
//!
//! The presentation layer consumes a flat JSON shape:
//!
//! ```json
//! { "state": "ready", "data": { "name": "Dune" } }
//! { "state": "error", "data": null, "error": "book not found" }
//! ```
//!
//! [`AsyncState::snapshot`] produces that shape as an [`AsyncStateSnapshot`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four phases of an asynchronous fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncState<T, E> {
    /// No fetch has been attempted yet.
    Initial,
    /// A fetch is in flight.
    Loading,
    /// The fetch succeeded.
    Ready(T),
    /// The fetch failed; the error detail is retained for the view.
    Error(E),
}

/// Variant discriminant without the payload.
///
/// Serialised as a lowercase string (`"initial"`, `"loading"`, `"ready"`,
/// `"error"`), which is what the views match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Initial,
    Loading,
    Ready,
    Error,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StateKind::Initial => "initial",
            StateKind::Loading => "loading",
            StateKind::Ready => "ready",
            StateKind::Error => "error",
        };
        f.write_str(s)
    }
}

impl<T, E> Default for AsyncState<T, E> {
    fn default() -> Self {
        AsyncState::Initial
    }
}

impl<T, E> From<Result<T, E>> for AsyncState<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => AsyncState::Ready(value),
            Err(error) => AsyncState::Error(error),
        }
    }
}

impl<T, E> AsyncState<T, E> {
    /// Returns the variant without its payload.
    pub fn kind(&self) -> StateKind {
        match self {
            AsyncState::Initial => StateKind::Initial,
            AsyncState::Loading => StateKind::Loading,
            AsyncState::Ready(_) => StateKind::Ready,
            AsyncState::Error(_) => StateKind::Error,
        }
    }

    pub fn is_initial(&self) -> bool {
        matches!(self, AsyncState::Initial)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AsyncState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AsyncState::Ready(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AsyncState::Error(_))
    }

    /// `true` once the fetch has settled, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, AsyncState::Ready(_) | AsyncState::Error(_))
    }

    /// The payload, present only in `Ready`.
    pub fn data(&self) -> Option<&T> {
        match self {
            AsyncState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The error detail, present only in `Error`.
    pub fn error(&self) -> Option<&E> {
        match self {
            AsyncState::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Consumes the state and returns the payload if it is `Ready`.
    pub fn into_data(self) -> Option<T> {
        match self {
            AsyncState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> AsyncState<&T, &E> {
        match self {
            AsyncState::Initial => AsyncState::Initial,
            AsyncState::Loading => AsyncState::Loading,
            AsyncState::Ready(value) => AsyncState::Ready(value),
            AsyncState::Error(error) => AsyncState::Error(error),
        }
    }

    /// Transforms the `Ready` payload, leaving the other variants untouched.
    pub fn map<U, F>(self, f: F) -> AsyncState<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            AsyncState::Initial => AsyncState::Initial,
            AsyncState::Loading => AsyncState::Loading,
            AsyncState::Ready(value) => AsyncState::Ready(f(value)),
            AsyncState::Error(error) => AsyncState::Error(error),
        }
    }

    /// Transforms the `Error` detail, leaving the other variants untouched.
    pub fn map_err<F2, F>(self, f: F) -> AsyncState<T, F2>
    where
        F: FnOnce(E) -> F2,
    {
        match self {
            AsyncState::Initial => AsyncState::Initial,
            AsyncState::Loading => AsyncState::Loading,
            AsyncState::Ready(value) => AsyncState::Ready(value),
            AsyncState::Error(error) => AsyncState::Error(f(error)),
        }
    }
}

impl<T: Clone, E: fmt::Display> AsyncState<T, E> {
    /// Flattens the state into the `{state, data, error}` shape the views use.
    ///
    /// The error detail is rendered with `Display`; `data` is `None` for every
    /// variant except `Ready`.
    pub fn snapshot(&self) -> AsyncStateSnapshot<T> {
        AsyncStateSnapshot {
            state: self.kind(),
            data: self.data().cloned(),
            error: self.error().map(ToString::to_string),
        }
    }
}

/// Serialisable, payload-flattened view of an [`AsyncState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncStateSnapshot<T> {
    pub state: StateKind,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
