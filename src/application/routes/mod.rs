pub(crate) mod books;

use axum::http::{HeaderValue, Request};
use axum::routing::{get, post, put};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span};

use crate::application::state::AppState;

/// 5 MB request body limit — covers the largest accepted cover upload.
const BODY_LIMIT_BYTES: usize = 5 * 1024 * 1024;

pub fn app_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .nest("/api/v1", api_router())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(BookpostMakeSpan)
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
                .layer(SetResponseHeaderLayer::overriding(
                    axum::http::header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                )),
        )
        .with_state(state)
}

fn api_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/my", get(books::list_my_books))
        .route(
            "/books/{id}",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/books/{id}/cover-url", put(books::set_cover_url))
        .route("/books/{id}/generate-cover", put(books::generate_cover))
        .route("/books/{id}/like", post(books::like_book))
}

#[derive(Clone)]
struct BookpostMakeSpan;

impl<B> MakeSpan<B> for BookpostMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
        )
    }
}
