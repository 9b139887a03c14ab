pub mod directory;
pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;

pub use directory::{DirectoryError, MemoryUserDirectory, PgUserDirectory, UserDirectory};
pub use manager::{DatabaseError, DatabaseManager};
pub use repository::Repository;
