//! The boundary to the generated HTTP client.
//!
//! The client itself is generated from the server's OpenAPI schema and is not
//! part of this crate.  The stores only need three of its operations, so they
//! depend on this trait instead.  Infrastructure provides the
//! implementations; tests use the `mockall`-generated `MockBookApi`.

use async_trait::async_trait;
use catalog_core::{Book, GetBookStateResponse};
use thiserror::Error;

/// Failure of one API operation.
///
/// This is the error detail stored in an `AsyncState::Error`, so it is
/// `Clone` and carries only owned strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered 404 for this book.
    #[error("book {0} not found")]
    NotFound(String),

    /// Any other non-success status.
    #[error("{operation} failed with status {status}")]
    Status { operation: String, status: u16 },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the schema.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// The operations of the generated book catalog client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookApi: Send + Sync {
    /// `GET /books`: every configured book.
    async fn get_books(&self) -> Result<Vec<Book>, ApiError>;

    /// `GET /books/{book_name}`.
    async fn get_book(&self, book_name: &str) -> Result<Book, ApiError>;

    /// `GET /books/{book_name}/state`: repo → ref → deployment state.
    async fn get_book_state(&self, book_name: &str) -> Result<GetBookStateResponse, ApiError>;
}
