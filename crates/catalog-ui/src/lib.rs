//! catalog-ui library entry point.
//!
//! The client-side state layer of the book catalog.  Views (home list, book
//! detail) never talk to the HTTP client directly; they read stores, and the
//! stores are filled through [`application::update_async_state`], which
//! records the loading lifecycle of each fetch in an
//! [`application::AsyncCell`].
//!
//! # Architecture
//!
//! ```text
//! catalog-core   AsyncState, Book/RefState models, RouteTable
//!       ↑
//! application/   AsyncCell + update_async_state, CatalogStore, CounterStore,
//!                BookApi trait (the generated-client boundary)
//!       ↑
//! infrastructure/
//!   config       catalog.toml: client runtime, codegen, logging
//!   api_client   endpoint paths, in-memory BookApi
//!   logging      tracing-subscriber setup
//!   ui_bridge    AppState + view commands returning serialisable DTOs
//! ```
//!
//! Nothing is registered globally.  An [`infrastructure::ui_bridge::AppState`]
//! is built from a `BookApi` implementation and a config, and handed to every
//! command that needs it.

/// Application layer: async cells, stores, and the API boundary trait.
pub mod application;

/// Infrastructure layer: config file, API adapters, logging, UI bridge.
pub mod infrastructure;
