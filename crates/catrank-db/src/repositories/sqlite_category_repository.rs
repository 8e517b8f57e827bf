//! `SQLite` implementation of the `CategoryRepository` trait.

use async_trait::async_trait;
use sqlx::SqlitePool;

use catrank_core::{CategoryRepository, NewProductCategory, ProductCategory, RepositoryError};

use super::category_queries;
use super::row_mappers::map_sqlx_error;

/// `SQLite` implementation of the `CategoryRepository` trait.
///
/// Single-row reads borrow a pooled connection; batch writes run in their
/// own transaction.
pub struct SqliteCategoryRepository {
    pool: SqlitePool,
}

impl SqliteCategoryRepository {
    /// Create a new `SQLite` category repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for SqliteCategoryRepository {
    async fn insert(
        &self,
        category: NewProductCategory,
    ) -> Result<ProductCategory, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        let mut inserted = category_queries::insert_all(&mut conn, &[category]).await?;
        inserted
            .pop()
            .ok_or_else(|| RepositoryError::Storage("insert returned no row".to_string()))
    }

    async fn insert_batch(
        &self,
        categories: Vec<NewProductCategory>,
    ) -> Result<Vec<ProductCategory>, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let inserted = category_queries::insert_all(&mut tx, &categories).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(inserted)
    }

    async fn get(&self, id: i64) -> Result<Option<ProductCategory>, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        category_queries::fetch_by_id(&mut conn, id).await
    }

    async fn list(&self) -> Result<Vec<ProductCategory>, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        category_queries::fetch_all(&mut conn).await
    }

    async fn list_children(
        &self,
        parent: Option<i64>,
    ) -> Result<Vec<ProductCategory>, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        category_queries::fetch_children(&mut conn, parent).await
    }

    async fn update_batch(&self, categories: Vec<ProductCategory>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        category_queries::update_all(&mut tx, &categories).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        category_queries::count(&mut conn).await
    }
}
