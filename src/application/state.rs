use std::sync::Arc;

use crate::application::services::{BookService, CoverPipeline};
use crate::domain::repositories::BookRepository;
use crate::infrastructure::database::Database;
use crate::infrastructure::image_gen::CoverGenerator;
use crate::infrastructure::object_store::ObjectStore;
use crate::infrastructure::repositories::books::SqlBookRepository;

/// Configuration for external services — everything that varies between
/// production and test environments. Repositories and services are created
/// automatically from the database pool.
pub struct AppStateConfig {
    pub object_store: Arc<dyn ObjectStore>,
    pub image_gen_url: String,
    pub image_gen_api_key: String,
}

#[derive(Clone)]
pub struct AppState {
    pub book_repo: Arc<dyn BookRepository>,
    pub book_service: BookService,
    pub cover_pipeline: CoverPipeline,
    pub cover_generator: CoverGenerator,
}

impl AppState {
    /// Build the full application state from a database connection and
    /// config. Creates all repositories and services internally.
    pub fn from_database(database: &Database, config: AppStateConfig) -> Self {
        let pool = database.clone_pool();

        let book_repo: Arc<dyn BookRepository> = Arc::new(SqlBookRepository::new(pool));
        let book_service = BookService::new(Arc::clone(&book_repo));

        #[allow(clippy::expect_used)] // startup-only: a broken TLS backend is unrecoverable
        let http_client = reqwest::ClientBuilder::new()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        let cover_pipeline = CoverPipeline::new(config.object_store, http_client.clone());
        let cover_generator = CoverGenerator::new(
            http_client,
            config.image_gen_url,
            config.image_gen_api_key,
        );

        Self {
            book_repo,
            book_service,
            cover_pipeline,
            cover_generator,
        }
    }
}
