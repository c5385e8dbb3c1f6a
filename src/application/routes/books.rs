use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use crate::application::errors::{ApiError, AppError};
use crate::application::state::AppState;
use crate::domain::books::{Book, NewBook, UpdateBook};
use crate::domain::covers::{CoverSource, UploadedCover};
use crate::domain::ids::{BookId, UserId};

/// Multipart fields shared by create and update: text parts plus an optional
/// uploaded cover file and an optional generator URL.
#[derive(Debug, Default)]
struct BookSubmission {
    title: Option<String>,
    content: Option<String>,
    user_id: Option<i64>,
    cover_file: Option<UploadedCover>,
    ai_cover_url: Option<String>,
}

impl BookSubmission {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(format!("invalid multipart body: {e}")))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            match name.as_str() {
                "title" => submission.title = Some(read_text(field).await?),
                "content" => submission.content = Some(read_text(field).await?),
                "user_id" => {
                    let raw = read_text(field).await?;
                    let id = raw
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| AppError::validation("user_id must be an integer"))?;
                    submission.user_id = Some(id);
                }
                "ai_cover_url" => submission.ai_cover_url = Some(read_text(field).await?),
                "cover_image" => {
                    let original_name = field.file_name().unwrap_or("cover").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let content = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::validation(format!("invalid cover upload: {e}")))?
                        .to_vec();
                    submission.cover_file = Some(UploadedCover {
                        content,
                        content_type,
                        original_name,
                    });
                }
                _ => {}
            }
        }

        Ok(submission)
    }

    fn user_id(&self) -> Result<UserId, AppError> {
        self.user_id
            .map(UserId::new)
            .ok_or_else(|| AppError::validation("user_id is required"))
    }

    fn into_cover_source(self) -> (CoverSource, BookFields) {
        let source = CoverSource::from_parts(self.cover_file, self.ai_cover_url);
        (
            source,
            BookFields {
                title: self.title,
                content: self.content,
            },
        )
    }
}

struct BookFields {
    title: Option<String>,
    content: Option<String>,
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::validation(format!("invalid multipart field: {e}")))
}

#[tracing::instrument(skip(state, multipart))]
pub(crate) async fn create_book(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let submission = BookSubmission::from_multipart(multipart).await?;
    let user_id = submission.user_id()?;
    let (source, fields) = submission.into_cover_source();

    let title = fields
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::validation("title is required"))?;
    let content = fields
        .content
        .ok_or_else(|| AppError::validation("content is required"))?;

    // Resolve the cover before touching the database: a failed transfer
    // fails the whole request, and no partial book is persisted.
    let cover = state
        .cover_pipeline
        .resolve(source)
        .await
        .map_err(AppError::from)?;

    let book = state
        .book_service
        .create(NewBook {
            title,
            content,
            user_id,
            cover_image_url: cover.into_url(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(book)).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    title: Option<String>,
}

#[tracing::instrument(skip(state))]
pub(crate) async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let search = query.title.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let books = state.book_service.list(search).await?;
    Ok(Json(books))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserQuery {
    user_id: i64,
}

#[tracing::instrument(skip(state))]
pub(crate) async fn list_my_books(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state
        .book_service
        .list_by_user(UserId::new(query.user_id))
        .await?;
    Ok(Json(books))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let book = state.book_service.get(BookId::new(id)).await?;
    Ok(Json(book))
}

#[tracing::instrument(skip(state, multipart))]
pub(crate) async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Book>, ApiError> {
    let submission = BookSubmission::from_multipart(multipart).await?;
    let user_id = submission.user_id()?;
    let (source, fields) = submission.into_cover_source();

    let cover_image_url = if source.is_none() {
        None
    } else {
        state
            .cover_pipeline
            .resolve(source)
            .await
            .map_err(AppError::from)?
            .into_url()
    };

    let changes = UpdateBook {
        title: fields.title.filter(|t| !t.trim().is_empty()),
        content: fields.content,
        cover_image_url,
    };

    if !changes.has_changes() {
        return Err(AppError::validation("no changes provided").into());
    }

    let book = state
        .book_service
        .update(BookId::new(id), changes, user_id)
        .await?;
    Ok(Json(book))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<UserQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .book_service
        .delete(BookId::new(id), UserId::new(query.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoverUrlUpdate {
    image_url: String,
}

#[tracing::instrument(skip(state, payload))]
pub(crate) async fn set_cover_url(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CoverUrlUpdate>,
) -> Result<Json<Book>, ApiError> {
    let url = payload.image_url.trim();
    if url.is_empty() {
        return Err(AppError::validation("image_url is required").into());
    }

    let book = state.book_service.set_cover_url(BookId::new(id), url).await?;
    Ok(Json(book))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateCoverRequest {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
}

/// Generate a cover image for the book, persist it through the pipeline,
/// and store the durable URL on the book. The generator's own URL is
/// temporary and never saved directly.
#[tracing::instrument(skip(state, payload))]
pub(crate) async fn generate_cover(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Option<Json<GenerateCoverRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();

    let book = state.book_service.get(BookId::new(id)).await?;
    let prompt = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map_or_else(|| format!("Book cover for \"{}\"", book.title), String::from);

    let temporary_url = state
        .cover_generator
        .generate(&prompt, request.api_key.as_deref())
        .await
        .map_err(AppError::from)?;

    let cover = state
        .cover_pipeline
        .resolve(CoverSource::RemoteUrl(temporary_url))
        .await
        .map_err(AppError::from)?;

    let url = cover
        .into_url()
        .ok_or_else(|| AppError::unexpected("pipeline returned no URL for generated cover"))?;

    state.book_service.set_cover_url(book.id, &url).await?;

    Ok(Json(json!({ "url": url })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikeQuery {
    upvote: bool,
}

#[tracing::instrument(skip(state))]
pub(crate) async fn like_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<LikeQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let recommend = state.book_service.like(BookId::new(id), query.upvote).await?;
    Ok(Json(json!({ "recommend": recommend })))
}
