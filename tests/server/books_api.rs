use bookpost::domain::books::Book;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{
    STORE_BASE_URL, book_form, create_default_book, mount_remote_image, spawn_app,
    with_cover_file,
};

#[tokio::test]
async fn creating_a_book_returns_a_201_for_valid_data() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.api_url("/books"))
        .multipart(book_form("The Left Hand of Darkness", "Winter on Gethen", 1))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);

    let book: Book = response.json().await.expect("Failed to parse response");
    assert_eq!(book.title, "The Left Hand of Darkness");
    assert_eq!(book.content, "Winter on Gethen");
    assert_eq!(book.user_id.into_inner(), 1);
    assert_eq!(book.cover_image_url, None);
    assert_eq!(book.recommend, 0);
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn creating_a_book_persists_the_data() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;

    let fetched = app
        .book_repo
        .get(book.id)
        .await
        .expect("Failed to fetch book");
    assert_eq!(fetched.title, "The Dispossessed");
}

#[tokio::test]
async fn creating_a_book_without_a_title_returns_400() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new()
        .text("content", "no title here")
        .text("user_id", "1");

    let response = client
        .post(app.api_url("/books"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn uploaded_cover_is_stored_with_declared_content_type() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let form = with_cover_file(
        book_form("A Wizard of Earthsea", "Sparrowhawk", 1),
        b"jpeg-bytes",
        "earthsea.jpg",
        "image/jpeg",
    );

    let response = client
        .post(app.api_url("/books"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);
    let book: Book = response.json().await.expect("Failed to parse response");

    let url = book.cover_image_url.expect("book has a cover URL");
    assert!(url.starts_with(STORE_BASE_URL));
    assert!(url.ends_with("_earthsea.jpg"));

    assert_eq!(app.store.write_count(), 1);
    let key = url.trim_start_matches("http://store.local/");
    let object = app.store.get(key).expect("object stored");
    assert_eq!(object.content, b"jpeg-bytes");
    assert_eq!(object.content_type, "image/jpeg");
}

#[tokio::test]
async fn remote_cover_url_is_fetched_and_stored_as_png() {
    let app = spawn_app().await;
    let remote_url = mount_remote_image(&app, "/generated/a.png", b"image-bytes").await;
    let client = reqwest::Client::new();

    let form = book_form("The Lathe of Heaven", "Effective dreams", 1)
        .text("ai_cover_url", remote_url);

    let response = client
        .post(app.api_url("/books"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);
    let book: Book = response.json().await.expect("Failed to parse response");

    let url = book.cover_image_url.expect("book has a cover URL");
    assert!(url.ends_with(".png"));

    // Declared remote type was image/jpeg; the stored type must be the
    // canonical remote-image type.
    assert_eq!(app.store.write_count(), 1);
    let key = url.trim_start_matches("http://store.local/");
    let object = app.store.get(key).expect("object stored");
    assert_eq!(object.content_type, "image/png");
}

#[tokio::test]
async fn uploaded_cover_wins_over_remote_url() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // No remote mock mounted: any fetch attempt would fail the request.
    let form = with_cover_file(
        book_form("Tehanu", "Back to Gont", 1),
        b"abc",
        "tehanu.jpg",
        "image/jpeg",
    )
    .text("ai_cover_url", "http://example/x.png");

    let response = client
        .post(app.api_url("/books"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);
    let book: Book = response.json().await.expect("Failed to parse response");

    assert_eq!(app.store.write_count(), 1);
    let url = book.cover_image_url.expect("book has a cover URL");
    assert!(url.ends_with("_tehanu.jpg"));
}

#[tokio::test]
async fn failed_remote_fetch_fails_the_whole_create() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.mock_server)
        .await;
    let client = reqwest::Client::new();

    let form = book_form("Doomed", "Never persisted", 1)
        .text("ai_cover_url", format!("{}/gone.png", app.mock_server.uri()));

    let response = client
        .post(app.api_url("/books"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 500);

    // No partial book: the whole create aborted.
    let books = app.book_repo.list(None).await.expect("Failed to list");
    assert!(books.is_empty());
}

#[tokio::test]
async fn store_outage_fails_the_whole_create() {
    let app = spawn_app().await;
    app.store.set_unavailable(true);
    let client = reqwest::Client::new();

    let form = with_cover_file(
        book_form("Unstored", "Never persisted", 1),
        b"abc",
        "cover.jpg",
        "image/jpeg",
    );

    let response = client
        .post(app.api_url("/books"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 500);
    let books = app.book_repo.list(None).await.expect("Failed to list");
    assert!(books.is_empty());
}

#[tokio::test]
async fn getting_a_book_returns_it() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;
    let client = reqwest::Client::new();

    let response = client
        .get(app.api_url(&format!("/books/{}", book.id)))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let fetched: Book = response.json().await.expect("Failed to parse response");
    assert_eq!(fetched.title, "The Dispossessed");
}

#[tokio::test]
async fn getting_a_missing_book_returns_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(app.api_url("/books/9999"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn listing_books_filters_by_title() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for title in ["Rocannon's World", "Planet of Exile", "City of Illusions"] {
        let response = client
            .post(app.api_url("/books"))
            .multipart(book_form(title, "Hainish cycle", 1))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), 201);
    }

    let all: Vec<Book> = client
        .get(app.api_url("/books"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(all.len(), 3);

    let filtered: Vec<Book> = client
        .get(app.api_url("/books?title=planet"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].title, "Planet of Exile");
}

#[tokio::test]
async fn listing_my_books_returns_only_mine() {
    let app = spawn_app().await;
    create_default_book(&app, 1).await;
    create_default_book(&app, 2).await;
    let client = reqwest::Client::new();

    let mine: Vec<Book> = client
        .get(app.api_url("/books/my?user_id=2"))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].user_id.into_inner(), 2);
}

#[tokio::test]
async fn updating_a_book_changes_its_fields() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;
    let client = reqwest::Client::new();

    let response = client
        .put(app.api_url(&format!("/books/{}", book.id)))
        .multipart(book_form("The Dispossessed (revised)", "Anarres and Urras", 1))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let updated: Book = response.json().await.expect("Failed to parse response");
    assert_eq!(updated.title, "The Dispossessed (revised)");
    assert_eq!(updated.content, "Anarres and Urras");
}

#[tokio::test]
async fn updating_someone_elses_book_returns_403() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;
    let client = reqwest::Client::new();

    let response = client
        .put(app.api_url(&format!("/books/{}", book.id)))
        .multipart(book_form("Hijacked", "Nope", 2))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn updating_with_a_new_cover_replaces_the_url() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;
    let client = reqwest::Client::new();

    let form = with_cover_file(book_form("The Dispossessed", "An ambiguous utopia", 1), b"new-cover", "new.png", "image/png");

    let response = client
        .put(app.api_url(&format!("/books/{}", book.id)))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let updated: Book = response.json().await.expect("Failed to parse response");
    let url = updated.cover_image_url.expect("book has a cover URL");
    assert!(url.ends_with("_new.png"));
    assert_eq!(app.store.write_count(), 1);
}

#[tokio::test]
async fn deleting_a_book_returns_204_and_removes_it() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;
    let client = reqwest::Client::new();

    let response = client
        .delete(app.api_url(&format!("/books/{}?user_id=1", book.id)))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(app.api_url(&format!("/books/{}", book.id)))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn deleting_someone_elses_book_returns_403() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;
    let client = reqwest::Client::new();

    let response = client
        .delete(app.api_url(&format!("/books/{}?user_id=2", book.id)))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 403);

    assert!(app.book_repo.get(book.id).await.is_ok());
}

#[tokio::test]
async fn liking_a_book_adjusts_the_counter() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;
    let client = reqwest::Client::new();

    for expected in 1..=2 {
        let response = client
            .post(app.api_url(&format!("/books/{}/like?upvote=true", book.id)))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["recommend"], expected);
    }

    // Downvotes floor at zero.
    for expected in [1, 0, 0] {
        let response = client
            .post(app.api_url(&format!("/books/{}/like?upvote=false", book.id)))
            .send()
            .await
            .expect("Failed to execute request");
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["recommend"], expected);
    }
}

#[tokio::test]
async fn liking_a_missing_book_returns_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.api_url("/books/9999/like?upvote=true"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn setting_the_cover_url_directly_updates_the_book() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;
    let client = reqwest::Client::new();

    let response = client
        .put(app.api_url(&format!("/books/{}/cover-url", book.id)))
        .json(&serde_json::json!({ "image_url": "https://cdn.example.com/cover.png" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let updated: Book = response.json().await.expect("Failed to parse response");
    assert_eq!(
        updated.cover_image_url.as_deref(),
        Some("https://cdn.example.com/cover.png")
    );
}

#[tokio::test]
async fn setting_a_blank_cover_url_returns_400() {
    let app = spawn_app().await;
    let book = create_default_book(&app, 1).await;
    let client = reqwest::Client::new();

    let response = client
        .put(app.api_url(&format!("/books/{}/cover-url", book.id)))
        .json(&serde_json::json!({ "image_url": "  " }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
}
