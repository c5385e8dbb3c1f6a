mod books;
pub mod covers;

pub use books::BookService;
pub use covers::{CoverPipeline, PipelineError};
