pub mod books;
pub mod covers;
pub mod errors;
pub mod ids;
pub mod repositories;

// Re-exports
pub use errors::RepositoryError;
