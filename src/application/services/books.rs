use std::sync::Arc;

use tracing::info;

use crate::application::errors::AppError;
use crate::domain::books::{Book, NewBook, UpdateBook};
use crate::domain::ids::{BookId, UserId};
use crate::domain::repositories::BookRepository;

#[derive(Clone)]
pub struct BookService {
    books: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(books: Arc<dyn BookRepository>) -> Self {
        Self { books }
    }

    pub async fn create(&self, new: NewBook) -> Result<Book, AppError> {
        let book = self.books.insert(new).await?;
        info!(book_id = %book.id, user_id = %book.user_id, "book created");
        Ok(book)
    }

    pub async fn get(&self, id: BookId) -> Result<Book, AppError> {
        Ok(self.books.get(id).await?)
    }

    pub async fn list(&self, title_search: Option<&str>) -> Result<Vec<Book>, AppError> {
        Ok(self.books.list(title_search).await?)
    }

    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Book>, AppError> {
        Ok(self.books.list_by_user(user_id).await?)
    }

    /// Owner-checked update. The caller-supplied `user_id` must match the
    /// book's owner.
    pub async fn update(
        &self,
        id: BookId,
        changes: UpdateBook,
        user_id: UserId,
    ) -> Result<Book, AppError> {
        self.check_owner(id, user_id).await?;
        Ok(self.books.update(id, changes).await?)
    }

    /// Owner-checked delete.
    pub async fn delete(&self, id: BookId, user_id: UserId) -> Result<(), AppError> {
        self.check_owner(id, user_id).await?;
        self.books.delete(id).await?;
        info!(book_id = %id, "book deleted");
        Ok(())
    }

    pub async fn set_cover_url(&self, id: BookId, url: &str) -> Result<Book, AppError> {
        Ok(self.books.set_cover_url(id, url).await?)
    }

    /// Adjust the recommendation counter and return its current value.
    pub async fn like(&self, id: BookId, upvote: bool) -> Result<i64, AppError> {
        let delta = if upvote { 1 } else { -1 };
        Ok(self.books.adjust_recommend(id, delta).await?)
    }

    async fn check_owner(&self, id: BookId, user_id: UserId) -> Result<(), AppError> {
        let book = self.books.get(id).await?;
        if book.user_id != user_id {
            return Err(AppError::forbidden("not the owner of this book"));
        }
        Ok(())
    }
}
