//! UI command bridge: exposes the stores to the web frontend.
//!
//! Every command takes the shared [`AppState`] and returns a
//! [`CommandResult`] whose payload is a serialisable DTO.  The frontend never
//! sees `AsyncCell`s or `ApiError`s; it receives
//! [`AsyncStateSnapshot`]s (`{ state, data, error }`) and re-renders whenever
//! it calls a command again.
//!
//! # Commands
//!
//! | Command              | Effect                                                |
//! |----------------------|-------------------------------------------------------|
//! | `navigate`           | resolve a path, start the fetches its view needs      |
//! | `get_home_view`      | snapshot of the book list                             |
//! | `get_book_view`      | snapshot of one book and its deployment state         |
//! | `refresh_books`      | refetch the book list                                 |
//! | `refresh_book_state` | refetch one book's state                              |
//! | `get_counter`        | current counter                                       |
//! | `increment_counter`  | add one to the counter                                |
//!
//! Commands that start a fetch return immediately.  The snapshot they return
//! shows `loading`; the settled value is visible to the next read.
//!
//! # Data Transfer Objects (DTOs)
//!
//! DTOs contain only JSON-friendly fields and mirror the TypeScript types the
//! views are written against.  Any change to a DTO here must be reflected on
//! the frontend side.

use std::sync::Arc;

use catalog_core::{
    AsyncStateSnapshot, Book, GetBookStateResponse, RouteName, RouteTable,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::{BookApi, CatalogStore, CounterStore};
use crate::infrastructure::config::AppConfig;

// ── Shared application state ──────────────────────────────────────────────────

/// State shared between UI commands.
///
/// Built once by whoever hosts the frontend and passed, as `Arc<AppState>`,
/// to every command.  There is no global instance.
pub struct AppState {
    /// Source of catalog data: the generated client or a fixture.
    pub api: Arc<dyn BookApi>,
    /// Book list and per-book state cells.
    pub catalog: CatalogStore,
    pub counter: Mutex<CounterStore>,
    pub routes: RouteTable,
    pub config: AppConfig,
}

impl AppState {
    /// State with the routes mounted at `/`.
    pub fn new(api: Arc<dyn BookApi>, config: AppConfig) -> Arc<Self> {
        Self::with_routes(api, config, RouteTable::default())
    }

    /// State with a caller-supplied route table (e.g. a non-root base path).
    pub fn with_routes(api: Arc<dyn BookApi>, config: AppConfig, routes: RouteTable) -> Arc<Self> {
        info!(
            base_url = %config.client.normalized_base_url(),
            root_path = %config.client.normalized_root_path(),
            route_base = routes.base(),
            "catalog state initialised"
        );
        Arc::new(Self {
            api,
            catalog: CatalogStore::new(),
            counter: Mutex::new(CounterStore::new()),
            routes,
            config,
        })
    }
}

// ── Data Transfer Objects (Presentation layer) ────────────────────────────────

/// One row of the home view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummaryDto {
    pub name: String,
    pub name_registry: String,
    /// Link to the book view; `None` if the name is empty.
    pub href: Option<String>,
    pub repo_count: usize,
    /// Preview host of every tracked ref, in declaration order.
    pub preview_hosts: Vec<String>,
}

impl BookSummaryDto {
    fn from_book(book: &Book, routes: &RouteTable) -> Self {
        Self {
            name: book.name.clone(),
            name_registry: book.name_registry.clone(),
            href: routes.book_href(&book.name).ok(),
            repo_count: book.repos.len(),
            preview_hosts: book
                .tracked_refs()
                .filter_map(|(_, r)| book.preview_host(r))
                .collect(),
        }
    }
}

/// The home view: the book list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeViewDto {
    pub books: AsyncStateSnapshot<Vec<BookSummaryDto>>,
}

/// The book view: one book and its deployment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookViewDto {
    pub name: String,
    /// The entry from the book list; `None` until the list is ready or if
    /// the list has no such book.
    pub book: Option<Book>,
    pub state: AsyncStateSnapshot<GetBookStateResponse>,
}

/// What `navigate` rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum ViewDto {
    Home(HomeViewDto),
    Book(BookViewDto),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDto {
    pub count: i64,
    pub double_count: i64,
}

impl From<CounterStore> for CounterDto {
    fn from(c: CounterStore) -> Self {
        Self {
            count: c.count(),
            double_count: c.double_count(),
        }
    }
}

/// Unified response wrapper used by UI commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── View snapshots ────────────────────────────────────────────────────────────

fn home_view(state: &AppState) -> HomeViewDto {
    let books = state.catalog.books().with(|s| {
        s.as_ref()
            .map(|books| {
                books
                    .iter()
                    .map(|b| BookSummaryDto::from_book(b, &state.routes))
                    .collect::<Vec<_>>()
            })
            .snapshot()
    });
    HomeViewDto { books }
}

async fn book_view(state: &AppState, book_name: &str) -> BookViewDto {
    BookViewDto {
        name: book_name.to_string(),
        book: state.catalog.get_book(book_name),
        state: state.catalog.book_state(book_name).await.snapshot(),
    }
}

fn start_book_fetches(state: &AppState) {
    if state.catalog.books().with(|s| s.is_initial()) {
        state.catalog.load_books(Arc::clone(&state.api));
    }
}

// ── UI commands ───────────────────────────────────────────────────────────────

/// Resolves `path` and renders its view.
///
/// - `home` loads the book list if it has never been requested.
/// - `books/:name` does the same for the list (to show the book entry) and
///   always fetches that book's state.
///
/// # Example (frontend)
/// ```ts
/// const view = await invoke<ViewDto>('navigate', { path: '/books/dune' });
/// ```
pub async fn navigate(state: Arc<AppState>, path: String) -> CommandResult<ViewDto> {
    let matched = match state.routes.resolve(&path) {
        Ok(m) => m,
        Err(e) => {
            warn!(path = %path, error = %e, "navigation failed");
            return CommandResult::err(e.to_string());
        }
    };
    debug!(path = %path, route = %matched.name, "navigating");

    match (matched.name, matched.book_name()) {
        (RouteName::Books, Some(book_name)) => {
            start_book_fetches(&state);
            state
                .catalog
                .load_book_state(Arc::clone(&state.api), book_name)
                .await;
            CommandResult::ok(ViewDto::Book(book_view(&state, book_name).await))
        }
        _ => {
            start_book_fetches(&state);
            CommandResult::ok(ViewDto::Home(home_view(&state)))
        }
    }
}

/// Current snapshot of the home view.  Starts nothing.
pub async fn get_home_view(state: Arc<AppState>) -> CommandResult<HomeViewDto> {
    CommandResult::ok(home_view(&state))
}

/// Current snapshot of the view for `book_name`.  Starts nothing.
pub async fn get_book_view(state: Arc<AppState>, book_name: String) -> CommandResult<BookViewDto> {
    CommandResult::ok(book_view(&state, &book_name).await)
}

/// Refetches the book list, even if it is already loaded.
pub async fn refresh_books(state: Arc<AppState>) -> CommandResult<HomeViewDto> {
    state.catalog.load_books(Arc::clone(&state.api));
    CommandResult::ok(home_view(&state))
}

/// Refetches the deployment state of `book_name`.
pub async fn refresh_book_state(
    state: Arc<AppState>,
    book_name: String,
) -> CommandResult<BookViewDto> {
    if book_name.trim().is_empty() {
        return CommandResult::err("book name must not be empty");
    }
    state
        .catalog
        .load_book_state(Arc::clone(&state.api), &book_name)
        .await;
    CommandResult::ok(book_view(&state, &book_name).await)
}

pub async fn get_counter(state: Arc<AppState>) -> CommandResult<CounterDto> {
    let counter = state.counter.lock().await;
    CommandResult::ok(CounterDto::from(*counter))
}

pub async fn increment_counter(state: Arc<AppState>) -> CommandResult<CounterDto> {
    let mut counter = state.counter.lock().await;
    counter.increment();
    debug!(count = counter.count(), "counter incremented");
    CommandResult::ok(CounterDto::from(*counter))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::book_api::MockBookApi;
    use crate::application::ApiError;
    use catalog_core::StateKind;

    fn books(names: &[&str]) -> Vec<Book> {
        names.iter().map(|n| Book::new(*n).unwrap()).collect()
    }

    fn make_state(mock: MockBookApi) -> Arc<AppState> {
        AppState::new(Arc::new(mock), AppConfig::default())
    }

    #[tokio::test]
    async fn test_home_view_is_initial_before_navigation() {
        // Arrange
        let state = make_state(MockBookApi::new());

        // Act
        let result = get_home_view(state).await;

        // Assert
        assert!(result.success);
        assert_eq!(result.data.unwrap().books.state, StateKind::Initial);
    }

    #[tokio::test]
    async fn test_navigate_home_starts_book_list_fetch() {
        // Arrange
        let mut mock = MockBookApi::new();
        mock.expect_get_books()
            .times(1)
            .returning(|| Ok(books(&["dune", "foundation"])));
        let state = make_state(mock);

        // Act
        let result = navigate(Arc::clone(&state), "/".to_string()).await;

        // Assert: the returned snapshot shows the fetch in flight
        match result.data {
            Some(ViewDto::Home(home)) => assert_eq!(home.books.state, StateKind::Loading),
            other => panic!("expected home view, got {other:?}"),
        }

        state.catalog.books().settled().await;
        let home = get_home_view(state).await.data.unwrap();
        let rows = home.books.data.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].href.as_deref(), Some("/books/dune"));
        assert_eq!(rows[0].preview_hosts, vec!["main.dune.localhost".to_string()]);
    }

    #[tokio::test]
    async fn test_navigate_home_twice_fetches_once() {
        let mut mock = MockBookApi::new();
        mock.expect_get_books().times(1).returning(|| Ok(books(&["a"])));
        let state = make_state(mock);

        navigate(Arc::clone(&state), "/".to_string()).await;
        state.catalog.books().settled().await;
        navigate(Arc::clone(&state), "/".to_string()).await;

        assert!(state.catalog.books().get().is_ready());
    }

    #[tokio::test]
    async fn test_navigate_book_fetches_list_and_state() {
        // Arrange
        let mut mock = MockBookApi::new();
        mock.expect_get_books().times(1).returning(|| Ok(books(&["dune"])));
        mock.expect_get_book_state()
            .withf(|name| name == "dune")
            .times(1)
            .returning(|_| Ok(GetBookStateResponse::new()));
        let state = make_state(mock);

        // Act
        let result = navigate(Arc::clone(&state), "/books/dune".to_string()).await;

        // Assert
        let Some(ViewDto::Book(view)) = result.data else {
            panic!("expected book view");
        };
        assert_eq!(view.name, "dune");
        assert_eq!(view.state.state, StateKind::Loading);

        state.catalog.books().settled().await;
        state.catalog.state_cell("dune").await.settled().await;
        let view = get_book_view(state, "dune".to_string()).await.data.unwrap();
        assert_eq!(view.book.map(|b| b.name), Some("dune".to_string()));
        assert_eq!(view.state.state, StateKind::Ready);
    }

    #[tokio::test]
    async fn test_book_view_reports_fetch_error() {
        let mut mock = MockBookApi::new();
        mock.expect_get_books().returning(|| Ok(Vec::new()));
        mock.expect_get_book_state()
            .returning(|name| Err(ApiError::NotFound(name.to_string())));
        let state = make_state(mock);

        navigate(Arc::clone(&state), "/books/ghost".to_string()).await;
        state.catalog.state_cell("ghost").await.settled().await;
        let view = get_book_view(state, "ghost".to_string()).await.data.unwrap();

        assert_eq!(view.book, None);
        assert_eq!(view.state.state, StateKind::Error);
        assert_eq!(view.state.error.as_deref(), Some("book ghost not found"));
    }

    #[tokio::test]
    async fn test_navigate_unknown_path_is_command_error() {
        let state = make_state(MockBookApi::new());
        let result = navigate(state, "/authors/herbert".to_string()).await;
        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(result.error.unwrap().contains("/authors/herbert"));
    }

    #[tokio::test]
    async fn test_refresh_books_refetches_loaded_list() {
        // Arrange
        let mut mock = MockBookApi::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_get_books()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(books(&["a"])));
        mock.expect_get_books()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(books(&["a", "b"])));
        let state = make_state(mock);
        navigate(Arc::clone(&state), "/".to_string()).await;
        state.catalog.books().settled().await;

        // Act
        let result = refresh_books(Arc::clone(&state)).await;
        assert_eq!(result.data.unwrap().books.state, StateKind::Loading);
        let settled = state.catalog.books().settled().await;

        // Assert
        assert_eq!(settled.data().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_refresh_book_state_rejects_blank_name() {
        let state = make_state(MockBookApi::new());
        let result = refresh_book_state(state, " ".to_string()).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_counter_commands() {
        // Arrange
        let state = make_state(MockBookApi::new());

        // Act
        increment_counter(Arc::clone(&state)).await;
        let after = increment_counter(Arc::clone(&state)).await;
        let read = get_counter(state).await;

        // Assert
        assert_eq!(
            after.data,
            Some(CounterDto {
                count: 2,
                double_count: 4
            })
        );
        assert_eq!(read.data.map(|c| c.count), Some(2));
    }

    #[test]
    fn test_view_dto_is_tagged_by_view() {
        let view = ViewDto::Home(HomeViewDto {
            books: AsyncStateSnapshot {
                state: StateKind::Loading,
                data: None,
                error: None,
            },
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "view": "home", "books": { "state": "loading", "data": null } })
        );
    }
}
