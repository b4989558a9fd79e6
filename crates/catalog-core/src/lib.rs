//! # catalog-core
//!
//! Shared domain layer for the book catalog client.  It contains the
//! lifecycle type for asynchronously fetched values, the data shapes exposed
//! by the generated HTTP client, and the client-side route table.
//!
//! This crate has no dependencies on async runtimes, sockets, or the file
//! system.  Everything here can be constructed and tested synchronously.
//!
//! # What is a "book"?
//!
//! A book is a deployable project: a set of git repositories, each with one
//! or more tracked refs.  Every tracked ref is built into an image and served
//! as a preview container at `<ref>.<book>.<base domain>`.  The catalog UI
//! lists books and shows, per book, the state of each tracked ref.
//!
//! # Modules
//!
//! - **`async_state`** – `AsyncState<T, E>`: initial / loading / ready / error.
//! - **`model`** – `Book`, `Repo`, `Ref`, `RefState` and the normalisation
//!   rules applied when they are constructed or deserialised.
//! - **`routes`** – The route table (`/` and `/books/:name`), path matching,
//!   and reverse URL generation.

pub mod async_state;
pub mod model;
pub mod routes;

pub use async_state::{AsyncState, AsyncStateSnapshot, StateKind};
pub use model::{Book, GetBookStateResponse, ModelError, Ref, RefState, Repo, TraefikConfig};
pub use routes::{Route, RouteError, RouteMatch, RouteName, RouteTable, ViewLoading};
