//! Row mapping helpers for `SQLite` queries.

use catrank_core::{ProductCategory, RepositoryError};
use sqlx::Row;

/// Shared SELECT column list for category queries.
pub const CATEGORY_SELECT_COLUMNS: &str = "id, rank, parent_category_id";

/// Parse a database row into a `ProductCategory`.
pub fn row_to_category(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProductCategory, RepositoryError> {
    Ok(ProductCategory {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        rank: row
            .try_get("rank")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        parent_category_id: row
            .try_get("parent_category_id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
    })
}

/// Map `SQLx` errors to `RepositoryError`.
///
/// Unique and foreign key violations become [`RepositoryError::Constraint`].
pub fn map_sqlx_error(e: sqlx::Error) -> RepositoryError {
    let is_constraint = e.as_database_error().is_some_and(|db_err| {
        db_err.is_unique_violation()
            || db_err.is_foreign_key_violation()
            || db_err.message().contains("constraint failed")
    });

    if is_constraint {
        RepositoryError::Constraint(e.to_string())
    } else {
        RepositoryError::Storage(e.to_string())
    }
}
