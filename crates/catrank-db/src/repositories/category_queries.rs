//! Connection-level category statements.
//!
//! Every function takes a `&mut SqliteConnection` so the same statements run
//! on a pooled connection, inside a transaction or inside a savepoint.
//! Callers decide the transaction boundary.

use catrank_core::{NewProductCategory, ProductCategory, RepositoryError};
use sqlx::SqliteConnection;

use super::row_mappers::{CATEGORY_SELECT_COLUMNS, map_sqlx_error, row_to_category};

/// Load every category, ordered by ID.
pub async fn fetch_all(
    conn: &mut SqliteConnection,
) -> Result<Vec<ProductCategory>, RepositoryError> {
    let sql = format!("SELECT {CATEGORY_SELECT_COLUMNS} FROM product_category ORDER BY id");
    tracing::debug!(sql = %sql, "query");

    let rows = sqlx::query(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    rows.iter().map(row_to_category).collect()
}

/// Load a single category.
pub async fn fetch_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<ProductCategory>, RepositoryError> {
    let sql = format!("SELECT {CATEGORY_SELECT_COLUMNS} FROM product_category WHERE id = ?");
    tracing::debug!(sql = %sql, id, "query");

    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    row.as_ref().map(row_to_category).transpose()
}

/// Load the children of `parent` (roots when `None`), ordered by rank.
pub async fn fetch_children(
    conn: &mut SqliteConnection,
    parent: Option<i64>,
) -> Result<Vec<ProductCategory>, RepositoryError> {
    // IS matches NULL against NULL, = would not
    let sql = format!(
        "SELECT {CATEGORY_SELECT_COLUMNS} FROM product_category \
         WHERE parent_category_id IS ? ORDER BY rank"
    );
    tracing::debug!(sql = %sql, parent = ?parent, "query");

    let rows = sqlx::query(&sql)
        .bind(parent)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    rows.iter().map(row_to_category).collect()
}

/// Count stored categories.
pub async fn count(conn: &mut SqliteConnection) -> Result<i64, RepositoryError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM product_category")
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)
}

/// Insert categories in order and return them with their assigned IDs.
pub async fn insert_all(
    conn: &mut SqliteConnection,
    categories: &[NewProductCategory],
) -> Result<Vec<ProductCategory>, RepositoryError> {
    let mut inserted = Vec::with_capacity(categories.len());

    for category in categories {
        tracing::debug!(
            rank = category.rank,
            parent_category_id = ?category.parent_category_id,
            "INSERT INTO product_category"
        );
        let result =
            sqlx::query("INSERT INTO product_category (rank, parent_category_id) VALUES (?, ?)")
                .bind(category.rank)
                .bind(category.parent_category_id)
                .execute(&mut *conn)
                .await
                .map_err(map_sqlx_error)?;

        inserted.push(category.clone().with_id(result.last_insert_rowid()));
    }

    Ok(inserted)
}

/// Write rank and parent of existing categories.
///
/// `SQLite` checks unique constraints row by row, so writing a permutation of
/// sibling ranks directly would collide with itself. Each row is first parked
/// on a distinct rank below the current minimum, then moved to its final
/// position. Run this inside a transaction; a failure leaves rows parked.
pub async fn update_all(
    conn: &mut SqliteConnection,
    categories: &[ProductCategory],
) -> Result<(), RepositoryError> {
    if categories.is_empty() {
        return Ok(());
    }

    let floor: i64 = sqlx::query_scalar("SELECT COALESCE(MIN(rank), 0) FROM product_category")
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    for (offset, category) in (1_i64..).zip(categories) {
        let parked = floor.checked_sub(offset).ok_or_else(|| {
            RepositoryError::Constraint("no free rank below current minimum".to_string())
        })?;
        tracing::debug!(id = category.id, rank = parked, "UPDATE product_category (park)");
        set_rank(conn, category.id, parked).await?;
    }

    for category in categories {
        tracing::debug!(
            id = category.id,
            rank = category.rank,
            parent_category_id = ?category.parent_category_id,
            "UPDATE product_category"
        );
        sqlx::query("UPDATE product_category SET rank = ?, parent_category_id = ? WHERE id = ?")
            .bind(category.rank)
            .bind(category.parent_category_id)
            .bind(category.id)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
    }

    Ok(())
}

async fn set_rank(conn: &mut SqliteConnection, id: i64, rank: i64) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE product_category SET rank = ? WHERE id = ?")
        .bind(rank)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(format!("category id={id}")));
    }
    Ok(())
}
