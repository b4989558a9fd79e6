//! CatalogStore: the book list and the per-book deployment state.
//!
//! The store holds one [`AsyncCell`] for the list of books and one per book
//! name for that book's `GetBookStateResponse`.  Different book names never
//! share a cell, so fetching the state of `dune` does not disturb a view that
//! is waiting on `foundation`.
//!
//! A name the server answered 404 for keeps its `Error` cell only until the
//! state of another book is requested; then it is dropped from the map, so
//! navigating to arbitrary `/books/<name>` paths does not grow the store.
//!
//! The store is an ordinary value.  It is created by whoever assembles the
//! application and passed to the views that need it.

use std::collections::HashMap;
use std::sync::Arc;

use catalog_core::{AsyncState, Book, GetBookStateResponse};
use tokio::sync::Mutex;
use tracing::debug;

use super::async_cell::{update_async_state, AsyncCell};
use super::book_api::{ApiError, BookApi};

pub type BooksCell = AsyncCell<Vec<Book>, ApiError>;
pub type BookStateCell = AsyncCell<GetBookStateResponse, ApiError>;

/// Client-side cache of catalog data, one async cell per resource.
#[derive(Debug, Default)]
pub struct CatalogStore {
    books: BooksCell,
    states: Mutex<HashMap<String, BookStateCell>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell holding the book list.
    pub fn books(&self) -> &BooksCell {
        &self.books
    }

    /// Finds a book by name in the current book list.
    ///
    /// Returns the first entry whose `name` equals `book_name`, or `None` if
    /// there is no such entry or the list is not `Ready`.
    pub fn get_book(&self, book_name: &str) -> Option<Book> {
        self.books.with(|state| {
            state
                .data()
                .and_then(|books| books.iter().find(|b| b.name == book_name))
                .cloned()
        })
    }

    /// The state cell for `book_name`, created in `Initial` on first use.
    pub async fn state_cell(&self, book_name: &str) -> BookStateCell {
        let mut states = self.states.lock().await;
        states.entry(book_name.to_string()).or_default().clone()
    }

    /// Current deployment state of `book_name`; `Initial` if never fetched.
    pub async fn book_state(
        &self,
        book_name: &str,
    ) -> AsyncState<GetBookStateResponse, ApiError> {
        let states = self.states.lock().await;
        states
            .get(book_name)
            .map(AsyncCell::get)
            .unwrap_or_default()
    }

    /// Names of the books whose state has been requested at least once.
    pub async fn tracked_state_names(&self) -> Vec<String> {
        let states = self.states.lock().await;
        let mut names: Vec<String> = states.keys().cloned().collect();
        names.sort();
        names
    }

    /// Starts fetching the book list.  The cell is `Loading` on return.
    pub fn load_books(&self, api: Arc<dyn BookApi>) {
        debug!("loading book list");
        update_async_state(&self.books, async move { api.get_books().await });
    }

    /// Starts fetching the state of `book_name`.  The cell is `Loading` on
    /// return.  Cells of other names that settled as `NotFound` are dropped.
    pub async fn load_book_state(&self, api: Arc<dyn BookApi>, book_name: &str) {
        let cell = {
            let mut states = self.states.lock().await;
            states.retain(|name, cell| name == book_name || !cell.with(is_not_found));
            states.entry(book_name.to_string()).or_default().clone()
        };
        let name = book_name.to_string();
        debug!(book = %name, "loading book state");
        update_async_state(&cell, async move { api.get_book_state(&name).await });
    }
}

fn is_not_found(state: &AsyncState<GetBookStateResponse, ApiError>) -> bool {
    matches!(state, AsyncState::Error(ApiError::NotFound(_)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::book_api::MockBookApi;
    use catalog_core::RefState;
    use std::collections::BTreeMap;

    fn books(names: &[&str]) -> Vec<Book> {
        names.iter().map(|n| Book::new(*n).unwrap()).collect()
    }

    fn state_with_hash(hash: &str) -> GetBookStateResponse {
        let ref_state = RefState {
            git_hash: Some(hash.to_string()),
            ..RefState::default()
        };
        BTreeMap::from([(
            "main".to_string(),
            BTreeMap::from([("refs/heads/main".to_string(), ref_state)]),
        )])
    }

    #[test]
    fn test_get_book_on_initial_catalog_is_none() {
        let store = CatalogStore::new();
        assert_eq!(store.get_book("a"), None);
    }

    #[test]
    fn test_get_book_while_loading_or_failed_is_none() {
        // Arrange
        let store = CatalogStore::new();

        // Act / Assert
        store.books().set(AsyncState::Loading);
        assert_eq!(store.get_book("a"), None);

        store
            .books()
            .set(AsyncState::Error(ApiError::Transport("down".to_string())));
        assert_eq!(store.get_book("a"), None);
    }

    #[test]
    fn test_get_book_on_ready_catalog_finds_by_name() {
        // Arrange
        let store = CatalogStore::new();
        store.books().set(AsyncState::Ready(books(&["a", "b"])));

        // Act
        let found = store.get_book("b");
        let missing = store.get_book("c");

        // Assert
        assert_eq!(found.map(|b| b.name), Some("b".to_string()));
        assert_eq!(missing, None);
    }

    #[test]
    fn test_get_book_returns_first_match() {
        // Arrange: two entries with the same name, different registry names
        let store = CatalogStore::new();
        let mut first = Book::new("a").unwrap();
        first.name_registry = "team/first".to_string();
        let mut second = Book::new("a").unwrap();
        second.name_registry = "team/second".to_string();
        store.books().set(AsyncState::Ready(vec![first, second]));

        // Act
        let found = store.get_book("a").unwrap();

        // Assert
        assert_eq!(found.name_registry, "team/first");
    }

    #[tokio::test]
    async fn test_load_books_fills_book_list() {
        // Arrange
        let mut mock = MockBookApi::new();
        mock.expect_get_books()
            .times(1)
            .returning(|| Ok(books(&["dune", "foundation"])));
        let store = CatalogStore::new();

        // Act
        store.load_books(Arc::new(mock));
        assert!(store.books().get().is_loading());
        let settled = store.books().settled().await;

        // Assert
        assert_eq!(settled.data().map(Vec::len), Some(2));
        assert!(store.get_book("foundation").is_some());
    }

    #[tokio::test]
    async fn test_load_books_failure_is_kept_in_cell() {
        let mut mock = MockBookApi::new();
        mock.expect_get_books()
            .returning(|| Err(ApiError::Transport("connection refused".to_string())));
        let store = CatalogStore::new();

        store.load_books(Arc::new(mock));
        let settled = store.books().settled().await;

        assert_eq!(
            settled,
            AsyncState::Error(ApiError::Transport("connection refused".to_string()))
        );
    }

    #[tokio::test]
    async fn test_book_state_is_initial_before_first_fetch() {
        let store = CatalogStore::new();
        assert!(store.book_state("dune").await.is_initial());
        assert!(store.tracked_state_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_state_cell_is_reused_per_name() {
        let store = CatalogStore::new();
        let a1 = store.state_cell("a").await;
        let a2 = store.state_cell("a").await;
        let b = store.state_cell("b").await;
        assert!(a1.same_cell(&a2));
        assert!(!a1.same_cell(&b));
    }

    #[tokio::test]
    async fn test_not_found_cells_are_dropped_on_next_state_fetch() {
        // Arrange
        let mut mock = MockBookApi::new();
        mock.expect_get_book_state()
            .withf(|name| name == "dune")
            .returning(|_| Ok(state_with_hash("abc")));
        mock.expect_get_book_state()
            .withf(|name| name.starts_with("ghost"))
            .returning(|name| Err(ApiError::NotFound(name.to_string())));
        let api: Arc<dyn BookApi> = Arc::new(mock);
        let store = CatalogStore::new();

        // Act
        store.load_book_state(Arc::clone(&api), "dune").await;
        store.state_cell("dune").await.settled().await;
        for name in ["ghost-1", "ghost-2", "ghost-3"] {
            store.load_book_state(Arc::clone(&api), name).await;
            store.state_cell(name).await.settled().await;
        }

        // Assert: only the latest unknown name is still tracked
        assert_eq!(store.tracked_state_names().await, vec!["dune", "ghost-3"]);
        assert!(store.book_state("ghost-3").await.is_error());
        assert!(store.book_state("ghost-1").await.is_initial());
        assert!(store.book_state("dune").await.is_ready());
    }

    #[tokio::test]
    async fn test_other_errors_keep_their_cells() {
        let mut mock = MockBookApi::new();
        mock.expect_get_book_state()
            .withf(|name| name == "dune")
            .returning(|_| Err(ApiError::Transport("offline".to_string())));
        mock.expect_get_book_state()
            .withf(|name| name == "foundation")
            .returning(|_| Ok(GetBookStateResponse::new()));
        let api: Arc<dyn BookApi> = Arc::new(mock);
        let store = CatalogStore::new();

        store.load_book_state(Arc::clone(&api), "dune").await;
        store.state_cell("dune").await.settled().await;
        store.load_book_state(Arc::clone(&api), "foundation").await;

        assert!(store.book_state("dune").await.is_error());
    }

    #[tokio::test]
    async fn test_load_book_state_uses_independent_cells() {
        // Arrange
        let mut mock = MockBookApi::new();
        mock.expect_get_book_state()
            .withf(|name| name == "dune")
            .returning(|_| Ok(state_with_hash("abc")));
        mock.expect_get_book_state()
            .withf(|name| name == "ghost")
            .returning(|name| Err(ApiError::NotFound(name.to_string())));
        let api: Arc<dyn BookApi> = Arc::new(mock);
        let store = CatalogStore::new();

        // Act
        store.load_book_state(Arc::clone(&api), "dune").await;
        store.load_book_state(Arc::clone(&api), "ghost").await;
        let dune = store.state_cell("dune").await.settled().await;
        let ghost = store.state_cell("ghost").await.settled().await;

        // Assert
        assert_eq!(dune, AsyncState::Ready(state_with_hash("abc")));
        assert_eq!(ghost, AsyncState::Error(ApiError::NotFound("ghost".to_string())));
        assert_eq!(store.tracked_state_names().await, vec!["dune", "ghost"]);
    }
}
