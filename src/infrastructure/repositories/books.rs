use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, query_scalar};

use crate::domain::RepositoryError;
use crate::domain::books::{Book, NewBook, UpdateBook};
use crate::domain::ids::{BookId, UserId};
use crate::domain::repositories::BookRepository;
use crate::infrastructure::database::DatabasePool;

#[derive(Clone)]
pub struct SqlBookRepository {
    pool: DatabasePool,
}

impl SqlBookRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn into_domain(record: BookRecord) -> Book {
        Book {
            id: BookId::from(record.id),
            title: record.title,
            content: record.content,
            user_id: UserId::from(record.user_id),
            cover_image_url: record.cover_image_url,
            recommend: record.recommend,
            created_at: record.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookRecord {
    id: i64,
    title: String,
    content: String,
    user_id: i64,
    cover_image_url: Option<String>,
    recommend: i64,
    created_at: DateTime<Utc>,
}

const BOOK_COLUMNS: &str = "id, title, content, user_id, cover_image_url, recommend, created_at";

#[async_trait]
impl BookRepository for SqlBookRepository {
    async fn insert(&self, book: NewBook) -> Result<Book, RepositoryError> {
        let record = query_as::<_, BookRecord>(&format!(
            r"INSERT INTO books (title, content, user_id, cover_image_url)
               VALUES (?, ?, ?, ?)
               RETURNING {BOOK_COLUMNS}",
        ))
        .bind(&book.title)
        .bind(&book.content)
        .bind(book.user_id.into_inner())
        .bind(&book.cover_image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::unexpected(e.to_string()))?;

        Ok(Self::into_domain(record))
    }

    async fn get(&self, id: BookId) -> Result<Book, RepositoryError> {
        let record = query_as::<_, BookRecord>(&format!(
            r"SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::unexpected(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(Self::into_domain(record))
    }

    async fn list(&self, title_search: Option<&str>) -> Result<Vec<Book>, RepositoryError> {
        let records = match title_search {
            Some(search) => {
                query_as::<_, BookRecord>(&format!(
                    r"SELECT {BOOK_COLUMNS} FROM books
                       WHERE title LIKE '%' || ? || '%' COLLATE NOCASE
                       ORDER BY created_at DESC, id DESC"
                ))
                .bind(search)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                query_as::<_, BookRecord>(&format!(
                    r"SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC, id DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| RepositoryError::unexpected(e.to_string()))?;

        Ok(records.into_iter().map(Self::into_domain).collect())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Book>, RepositoryError> {
        let records = query_as::<_, BookRecord>(&format!(
            r"SELECT {BOOK_COLUMNS} FROM books
               WHERE user_id = ?
               ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::unexpected(e.to_string()))?;

        Ok(records.into_iter().map(Self::into_domain).collect())
    }

    async fn update(&self, id: BookId, changes: UpdateBook) -> Result<Book, RepositoryError> {
        let record = query_as::<_, BookRecord>(&format!(
            r"UPDATE books
               SET title = COALESCE(?, title),
                   content = COALESCE(?, content),
                   cover_image_url = COALESCE(?, cover_image_url)
               WHERE id = ?
               RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.cover_image_url)
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::unexpected(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(Self::into_domain(record))
    }

    async fn set_cover_url(&self, id: BookId, url: &str) -> Result<Book, RepositoryError> {
        let record = query_as::<_, BookRecord>(&format!(
            r"UPDATE books SET cover_image_url = ? WHERE id = ? RETURNING {BOOK_COLUMNS}"
        ))
        .bind(url)
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::unexpected(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(Self::into_domain(record))
    }

    async fn adjust_recommend(&self, id: BookId, delta: i64) -> Result<i64, RepositoryError> {
        let recommend: i64 = query_scalar(
            r"UPDATE books SET recommend = MAX(0, recommend + ?)
               WHERE id = ?
               RETURNING recommend",
        )
        .bind(delta)
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::unexpected(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(recommend)
    }

    async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
        let result = query(r"DELETE FROM books WHERE id = ?")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
