use async_trait::async_trait;

use crate::domain::books::{Book, NewBook, UpdateBook};
use crate::domain::errors::RepositoryError;
use crate::domain::ids::{BookId, UserId};

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn insert(&self, book: NewBook) -> Result<Book, RepositoryError>;
    async fn get(&self, id: BookId) -> Result<Book, RepositoryError>;
    /// List all books, optionally filtered by a case-insensitive title search.
    async fn list(&self, title_search: Option<&str>) -> Result<Vec<Book>, RepositoryError>;
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Book>, RepositoryError>;
    async fn update(&self, id: BookId, changes: UpdateBook) -> Result<Book, RepositoryError>;
    async fn set_cover_url(&self, id: BookId, url: &str) -> Result<Book, RepositoryError>;
    /// Adjust the recommendation counter and return its new value. The
    /// counter never goes below zero.
    async fn adjust_recommend(&self, id: BookId, delta: i64) -> Result<i64, RepositoryError>;
    async fn delete(&self, id: BookId) -> Result<(), RepositoryError>;
}
