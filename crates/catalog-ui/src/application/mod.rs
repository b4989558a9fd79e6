//! Application layer for the catalog client.
//!
//! - **`async_cell`** – `AsyncCell<T, E>`, a shared observable slot holding
//!   an `AsyncState`, and `update_async_state`, which drives one fetch through
//!   `Loading` into `Ready` or `Error`.
//! - **`book_api`** – The `BookApi` trait: the operations of the generated
//!   HTTP client, as the stores consume them.
//! - **`catalog`** – `CatalogStore`: the book list plus per-book state cells.
//! - **`counter`** – `CounterStore`: the counter demo.
//!
//! Nothing here opens sockets or touches the file system.  Fetches arrive as
//! futures produced by a `BookApi` implementation that is injected by the
//! caller.

pub mod async_cell;
pub mod book_api;
pub mod catalog;
pub mod counter;

pub use async_cell::{update_async_state, AsyncCell};
pub use book_api::{ApiError, BookApi};
pub use catalog::CatalogStore;
pub use counter::CounterStore;
