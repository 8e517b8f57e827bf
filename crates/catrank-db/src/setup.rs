//! Database setup and initialization.
//!
//! This module provides the `setup_database()` function for initializing
//! the `SQLite` database with the category schema, and `refresh_schema()`
//! for resetting it between test runs.

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::path::Path;

/// Sets up the `SQLite` database connection and ensures the schema exists.
///
/// This function:
/// 1. Creates the parent directory and database file if missing
/// 2. Enables foreign key enforcement
/// 3. Creates the category table and indexes
///
/// # Errors
///
/// Returns an error if:
/// - The database file cannot be opened or created
/// - Schema creation fails
///
/// # Example
///
/// ```rust,no_run
/// use catrank_db::setup_database;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let pool = setup_database(Path::new("/tmp/catrank/test-db.db")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn setup_database(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true),
    )
    .await?;

    create_schema(&pool).await?;
    tracing::info!(path = %db_path.display(), "Database ready");

    Ok(pool)
}

/// Drops and recreates the category schema.
///
/// All stored categories are lost.
pub async fn refresh_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DROP TABLE IF EXISTS product_category")
        .execute(pool)
        .await?;
    create_schema(pool).await?;
    tracing::info!("Schema refreshed");
    Ok(())
}

/// Sets up an in-memory `SQLite` database for testing.
///
/// The pool holds a single connection that never expires, since every
/// in-memory connection would otherwise see its own empty database.
#[cfg(any(test, feature = "test-utils"))]
pub async fn setup_test_database() -> Result<SqlitePool> {
    let options = "sqlite::memory:"
        .parse::<SqliteConnectOptions>()?
        .foreign_keys(true);
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Creates the category schema.
///
/// Safe to call multiple times as all statements use IF NOT EXISTS.
async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            rank NUMERIC NOT NULL DEFAULT 0,
            parent_category_id INTEGER REFERENCES product_category(id),
            UNIQUE (parent_category_id, rank)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // NULL parents compare distinct in the table constraint, so roots need their own index
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_product_category_root_rank
         ON product_category(rank) WHERE parent_category_id IS NULL",
    )
    .execute(pool)
    .await?;

    Ok(())
}
