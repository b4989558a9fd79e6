//! Observable cells holding an [`AsyncState`], and the helper that drives a
//! fetch through them.
//!
//! # Why a `watch` channel?
//!
//! A view needs two things from a cell: the current value (to render now)
//! and a notification when it changes (to re-render).  `tokio::sync::watch`
//! provides exactly that.  The cell owns the `Sender`; every view that wants
//! updates calls [`AsyncCell::subscribe`] and awaits `changed()`.
//!
//! Writing to a `watch` channel is synchronous (`send_replace` never awaits),
//! which is what lets [`update_async_state`] put the cell into `Loading`
//! before it returns.
//!
//! # Overlapping fetches
//!
//! Calling [`update_async_state`] again on a cell whose previous fetch has not
//! settled starts a second, independent task.  Neither task is cancelled;
//! whichever settles last writes the final state.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use catalog_core::AsyncState;
use tokio::sync::watch;
use tracing::{debug, error};

/// A shared slot holding the [`AsyncState`] of one logical resource.
///
/// Cloning the cell yields another handle to the same slot.
pub struct AsyncCell<T, E> {
    tx: Arc<watch::Sender<AsyncState<T, E>>>,
}

impl<T, E> Clone for AsyncCell<T, E> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T, E> Default for AsyncCell<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for AsyncCell<T, E>
where
    T: fmt::Debug,
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AsyncCell").field(&*self.tx.borrow()).finish()
    }
}

impl<T, E> AsyncCell<T, E> {
    /// A cell in the `Initial` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AsyncState::Initial);
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the state and notifies subscribers.
    pub fn set(&self, state: AsyncState<T, E>) {
        self.tx.send_replace(state);
    }

    /// Runs `f` against the current state without cloning it.
    ///
    /// `f` must not call back into this cell.
    pub fn with<R>(&self, f: impl FnOnce(&AsyncState<T, E>) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// A receiver that observes every later change of this cell.
    pub fn subscribe(&self) -> watch::Receiver<AsyncState<T, E>> {
        self.tx.subscribe()
    }

    /// `true` if both handles point at the same slot.
    pub fn same_cell(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }
}

impl<T: Clone, E: Clone> AsyncCell<T, E> {
    /// A clone of the current state.
    pub fn get(&self) -> AsyncState<T, E> {
        self.tx.borrow().clone()
    }

    /// Waits until the cell holds `Ready` or `Error` and returns that state.
    ///
    /// Returns immediately if the cell is already settled.  Waits forever if
    /// the cell is `Initial` and nobody starts a fetch.
    pub async fn settled(&self) -> AsyncState<T, E> {
        let mut rx = self.subscribe();
        // Clone before `rx` goes out of scope; the guard borrows it.
        let settled = rx
            .wait_for(AsyncState::is_settled)
            .await
            .map(|state| state.clone());
        // The sender lives in `self`, so the channel cannot close here.
        settled.unwrap_or_else(|_| self.get())
    }
}

/// Drives `operation` through `cell`.
///
/// The cell is set to `Loading` before this function returns.  The operation
/// is then awaited on a spawned Tokio task; its outcome is written to the cell
/// as `Ready(value)` or `Error(error)`.  A failure is logged at `error` level
/// and goes no further: the caller never sees it except through the cell.
///
/// Must be called from within a Tokio runtime.
pub fn update_async_state<T, E, F>(cell: &AsyncCell<T, E>, operation: F)
where
    T: Send + Sync + 'static,
    E: fmt::Display + Send + Sync + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
{
    let resource = std::any::type_name::<T>();
    cell.set(AsyncState::Loading);
    debug!(resource, "fetch started");

    let cell = cell.clone();
    tokio::spawn(async move {
        match operation.await {
            Ok(value) => {
                debug!(resource, "fetch ready");
                cell.set(AsyncState::Ready(value));
            }
            Err(e) => {
                error!(resource, error = %e, "fetch failed");
                cell.set(AsyncState::Error(e));
            }
        }
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
