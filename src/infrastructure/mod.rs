pub mod database;
pub mod image_gen;
pub mod object_store;
pub mod repositories;
