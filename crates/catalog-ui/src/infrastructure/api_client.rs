//! Adapters for the book catalog API.
//!
//! - [`ApiEndpoint`] names the operations of the generated client and
//!   renders their URLs from a [`ClientRuntimeConfig`].
//! - [`InMemoryBookApi`] is a [`BookApi`] backed by fixture data.  It answers
//!   the way the server does (404 for unknown books) and is what the UI
//!   bridge runs against in demos and integration tests.

use std::collections::HashMap;

use async_trait::async_trait;
use catalog_core::{Book, GetBookStateResponse};
use tracing::{debug, warn};

use crate::application::{ApiError, BookApi};
use crate::infrastructure::config::ClientRuntimeConfig;

/// One operation of the catalog API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEndpoint {
    HealthCheck,
    GetBooks,
    GetBook { book_name: String },
    GetBookState { book_name: String },
}

impl ApiEndpoint {
    /// Operation id in the OpenAPI schema; also the generated function name.
    pub fn operation_id(&self) -> &'static str {
        match self {
            ApiEndpoint::HealthCheck => "health_check",
            ApiEndpoint::GetBooks => "get_books",
            ApiEndpoint::GetBook { .. } => "get_book",
            ApiEndpoint::GetBookState { .. } => "get_book_state",
        }
    }

    /// Path relative to the API root, e.g. `/books/dune/state`.  The book
    /// name is percent-encoded into a single segment.
    pub fn path(&self) -> String {
        match self {
            ApiEndpoint::HealthCheck => "/".to_string(),
            ApiEndpoint::GetBooks => "/books".to_string(),
            ApiEndpoint::GetBook { book_name } => {
                format!("/books/{}", urlencoding::encode(book_name))
            }
            ApiEndpoint::GetBookState { book_name } => {
                format!("/books/{}/state", urlencoding::encode(book_name))
            }
        }
    }

    /// Absolute URL of this endpoint under `config`.
    pub fn url(&self, config: &ClientRuntimeConfig) -> String {
        format!(
            "{}{}{}",
            config.normalized_base_url(),
            config.normalized_root_path(),
            self.path()
        )
    }
}

/// A [`BookApi`] that serves fixture data from memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookApi {
    books: Vec<Book>,
    states: HashMap<String, GetBookStateResponse>,
}

impl InMemoryBookApi {
    pub fn new(books: Vec<Book>) -> Self {
        Self {
            books,
            states: HashMap::new(),
        }
    }

    /// Builds the fixture from a `GET /books` response body.
    ///
    /// # Errors
    ///
    /// [`ApiError::Decode`] if the body does not match the `Book` schema.
    pub fn from_json(books_json: &str) -> Result<Self, ApiError> {
        let books: Vec<Book> = serde_json::from_str(books_json)?;
        Ok(Self::new(books))
    }

    /// Registers the state returned for `book_name`.
    pub fn with_state(mut self, book_name: impl Into<String>, state: GetBookStateResponse) -> Self {
        self.states.insert(book_name.into(), state);
        self
    }

    /// Registers the state for `book_name` from a `GET /books/{name}/state`
    /// response body.
    ///
    /// # Errors
    ///
    /// [`ApiError::Decode`] if the body does not match the schema.
    pub fn with_state_json(self, book_name: impl Into<String>, json: &str) -> Result<Self, ApiError> {
        let state: GetBookStateResponse = serde_json::from_str(json)?;
        Ok(self.with_state(book_name, state))
    }

    fn find(&self, book_name: &str) -> Result<&Book, ApiError> {
        self.books
            .iter()
            .find(|b| b.name == book_name)
            .ok_or_else(|| {
                warn!(book = book_name, "book not found");
                ApiError::NotFound(book_name.to_string())
            })
    }
}

#[async_trait]
impl BookApi for InMemoryBookApi {
    async fn get_books(&self) -> Result<Vec<Book>, ApiError> {
        debug!(operation = ApiEndpoint::GetBooks.operation_id(), count = self.books.len(), "serving books");
        Ok(self.books.clone())
    }

    async fn get_book(&self, book_name: &str) -> Result<Book, ApiError> {
        debug!(operation = "get_book", book = book_name, "serving book");
        self.find(book_name).cloned()
    }

    async fn get_book_state(&self, book_name: &str) -> Result<GetBookStateResponse, ApiError> {
        debug!(operation = "get_book_state", book = book_name, "serving book state");
        // Unknown books are 404; known books without recorded state have
        // nothing deployed yet.
        self.find(book_name)?;
        Ok(self.states.get(book_name).cloned().unwrap_or_default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
