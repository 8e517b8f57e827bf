//! Composition utilities for wiring catrank with `SQLite` backends.
//!
//! This module is focused purely on construction and should not contain
//! any domain logic.

use sqlx::SqlitePool;
use std::sync::Arc;

use catrank_core::{CategoryService, DatabaseConfig};

use crate::entity_manager::EntityManager;
use crate::repositories::SqliteCategoryRepository;
use crate::setup::setup_database;

/// Factory for creating pools, repositories and managers.
pub struct CoreFactory;

impl CoreFactory {
    /// Open the database described by `config`, creating the schema if needed.
    pub async fn create_pool(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
        setup_database(&config.database_path()).await
    }

    /// Open the database configured through `CATRANK_DATA_DIR` and `CATRANK_DB_NAME`.
    pub async fn create_pool_from_env() -> anyhow::Result<SqlitePool> {
        let config = DatabaseConfig::from_env()?;
        Self::create_pool(&config).await
    }

    /// Create a category repository from a pool.
    pub fn category_repository(pool: SqlitePool) -> Arc<SqliteCategoryRepository> {
        Arc::new(SqliteCategoryRepository::new(pool))
    }

    /// Build a `CategoryService` backed by `SQLite`.
    pub fn category_service(pool: SqlitePool) -> CategoryService {
        CategoryService::new(Self::category_repository(pool))
    }

    /// Create a root entity manager for a pool.
    pub fn entity_manager(pool: SqlitePool) -> EntityManager {
        EntityManager::new(pool)
    }
}

/// Test database helper for integration tests.
///
/// Holds a file-backed database named after [`catrank_core::DEFAULT_DB_NAME`]
/// inside a temporary directory. The schema is reset on creation; the
/// directory is removed when the helper is dropped.
#[cfg(any(test, feature = "test-utils"))]
pub struct TestDb {
    pool: SqlitePool,
    config: DatabaseConfig,
    _dir: tempfile::TempDir,
}

#[cfg(any(test, feature = "test-utils"))]
impl TestDb {
    /// Create a fresh test database with an empty schema.
    pub async fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = DatabaseConfig::new(dir.path(), catrank_core::DEFAULT_DB_NAME)?;
        let pool = CoreFactory::create_pool(&config).await?;
        crate::setup::refresh_schema(&pool).await?;

        Ok(Self {
            pool,
            config,
            _dir: dir,
        })
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Configuration the database was opened with.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Create a root entity manager using this test database.
    pub fn entity_manager(&self) -> EntityManager {
        EntityManager::new(self.pool.clone())
    }

    /// Create a category repository using this test database.
    pub fn category_repository(&self) -> SqliteCategoryRepository {
        SqliteCategoryRepository::new(self.pool.clone())
    }

    /// Close every pooled connection, then remove the database directory.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
