//! Repository implementations using `SQLite`.
//!
//! These implementations encapsulate all SQL queries and database access.
//! The `SqlitePool` is confined to this crate and never exposed through
//! the port trait signatures.

pub(crate) mod category_queries;
mod row_mappers;
mod sqlite_category_repository;

pub(crate) use row_mappers::map_sqlx_error;
pub use sqlite_category_repository::SqliteCategoryRepository;
