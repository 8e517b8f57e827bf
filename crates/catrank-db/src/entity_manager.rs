//! Unit of work over the category table.
//!
//! An [`EntityManager`] queues new categories and tracks loaded ones in an
//! identity map. Nothing reaches the database until [`EntityManager::flush`],
//! which writes every queued change in one transaction. Forked managers share
//! the pool but not the identity map, so a fork always reads fresh rows.
//!
//! ```rust,no_run
//! use catrank_core::NewProductCategory;
//! use catrank_db::EntityManager;
//! # async fn example(pool: sqlx::SqlitePool) -> Result<(), catrank_core::RepositoryError> {
//! let mut em = EntityManager::new(pool);
//! em.create(NewProductCategory::new(1));
//! let inserted = em.flush().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use catrank_core::{NewProductCategory, ProductCategory, RepositoryError};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::repositories::category_queries;
use crate::repositories::map_sqlx_error;

/// Connection a manager reads through: its open transaction if it has one,
/// otherwise a connection borrowed from the pool.
enum ConnectionRef<'a> {
    Scoped(&'a mut SqliteConnection),
    Pooled(PoolConnection<Sqlite>),
}

impl ConnectionRef<'_> {
    fn get(&mut self) -> &mut SqliteConnection {
        match self {
            Self::Scoped(conn) => conn,
            Self::Pooled(conn) => conn,
        }
    }
}

/// Unit of work for product categories.
pub struct EntityManager {
    pool: SqlitePool,
    /// Open transaction when running inside [`EntityManager::transactional`].
    tx: Option<Transaction<'static, Sqlite>>,
    /// Categories queued by `create`, in creation order.
    pending: Vec<NewProductCategory>,
    /// Last known stored state of every managed category.
    identity_map: BTreeMap<i64, ProductCategory>,
    /// Managed categories handed back through `persist`.
    dirty: BTreeMap<i64, ProductCategory>,
}

impl EntityManager {
    /// Create a manager with an empty identity map.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            tx: None,
            pending: Vec::new(),
            identity_map: BTreeMap::new(),
            dirty: BTreeMap::new(),
        }
    }

    /// A new manager on the same pool with its own, empty identity map.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self::new(self.pool.clone())
    }

    /// Queue a new category for insertion on the next flush.
    pub fn create(&mut self, category: NewProductCategory) {
        self.pending.push(category);
    }

    /// Hand back a loaded category so its changes are written on the next flush.
    ///
    /// Only categories loaded or created through this manager are accepted.
    pub fn persist(&mut self, category: ProductCategory) -> Result<(), RepositoryError> {
        if !self.identity_map.contains_key(&category.id) {
            return Err(RepositoryError::NotFound(format!(
                "category id={} is not managed by this entity manager",
                category.id
            )));
        }
        self.dirty.insert(category.id, category);
        Ok(())
    }

    /// Whether `id` is in this manager's identity map.
    pub fn is_managed(&self, id: i64) -> bool {
        self.identity_map.contains_key(&id)
    }

    /// Whether a flush would write anything.
    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty() || !self.changed().is_empty()
    }

    /// Forget queued work and every managed category.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.identity_map.clear();
        self.dirty.clear();
    }

    /// Load every category, ordered by ID.
    pub async fn find_all(&mut self) -> Result<Vec<ProductCategory>, RepositoryError> {
        let categories = {
            let mut conn = self.connection().await?;
            category_queries::fetch_all(conn.get()).await?
        };
        self.track(&categories);
        Ok(categories)
    }

    /// Load a single category.
    pub async fn find(&mut self, id: i64) -> Result<Option<ProductCategory>, RepositoryError> {
        let category = {
            let mut conn = self.connection().await?;
            category_queries::fetch_by_id(conn.get(), id).await?
        };
        self.track(category.as_slice());
        Ok(category)
    }

    /// Load the children of `parent` (roots when `None`), ordered by rank.
    pub async fn find_by_parent(
        &mut self,
        parent: Option<i64>,
    ) -> Result<Vec<ProductCategory>, RepositoryError> {
        let categories = {
            let mut conn = self.connection().await?;
            category_queries::fetch_children(conn.get(), parent).await?
        };
        self.track(&categories);
        Ok(categories)
    }

    /// Write queued changes.
    ///
    /// Updates run before inserts so a new category can take a rank that an
    /// update frees. Persisted categories equal to their stored state are
    /// skipped. Returns the inserted categories in creation order.
    ///
    /// Outside a transactional scope the writes get their own transaction;
    /// inside one they run in a savepoint, so a failed flush leaves the
    /// scope usable.
    pub async fn flush(&mut self) -> Result<Vec<ProductCategory>, RepositoryError> {
        let updates = self.changed();
        if updates.is_empty() && self.pending.is_empty() {
            self.dirty.clear();
            tracing::debug!("Flush skipped, nothing changed");
            return Ok(Vec::new());
        }

        let mut unit = match self.tx.as_mut() {
            Some(tx) => sqlx::Connection::begin(&mut **tx).await,
            None => self.pool.begin().await,
        }
        .map_err(map_sqlx_error)?;

        category_queries::update_all(&mut unit, &updates).await?;
        let inserted = category_queries::insert_all(&mut unit, &self.pending).await?;
        unit.commit().await.map_err(map_sqlx_error)?;

        tracing::debug!(
            updated = updates.len(),
            inserted = inserted.len(),
            "Flushed categories"
        );

        self.pending.clear();
        self.dirty.clear();
        self.track(&updates);
        self.track(&inserted);
        Ok(inserted)
    }

    /// Run `work` in a database transaction.
    ///
    /// `work` receives a fresh manager bound to the transaction. When it
    /// returns `Ok` the manager is flushed and the transaction committed;
    /// when it returns `Err`, or the flush fails, nothing is written.
    ///
    /// ```rust,no_run
    /// # use catrank_db::EntityManager;
    /// # use catrank_core::RepositoryError;
    /// # async fn example(em: EntityManager) -> Result<(), RepositoryError> {
    /// em.transactional(async |scope: &mut EntityManager| {
    ///     let mut categories = scope.find_all().await?;
    ///     if let Some(mut last) = categories.pop() {
    ///         last.rank += 1;
    ///         scope.persist(last)?;
    ///     }
    ///     Ok::<_, RepositoryError>(())
    /// })
    /// .await
    /// # }
    /// ```
    pub async fn transactional<T, F>(&self, work: F) -> Result<T, RepositoryError>
    where
        F: AsyncFnOnce(&mut Self) -> Result<T, RepositoryError>,
    {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut scope = Self {
            tx: Some(tx),
            ..self.fork()
        };
        tracing::debug!("Transaction started");

        let value = match work(&mut scope).await {
            Ok(value) => value,
            Err(e) => {
                scope.rollback().await;
                return Err(e);
            }
        };

        if let Err(e) = scope.flush().await {
            scope.rollback().await;
            return Err(e);
        }
        scope.commit().await?;

        Ok(value)
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await.map_err(map_sqlx_error)?;
            tracing::debug!("Transaction committed");
        }
        Ok(())
    }

    async fn rollback(&mut self) {
        if let Some(tx) = self.tx.take() {
            match tx.rollback().await {
                Ok(()) => tracing::debug!("Transaction rolled back"),
                Err(e) => tracing::warn!(error = %e, "Transaction rollback failed"),
            }
        }
    }

    async fn connection(&mut self) -> Result<ConnectionRef<'_>, RepositoryError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(ConnectionRef::Scoped(&mut **tx)),
            None => self
                .pool
                .acquire()
                .await
                .map(ConnectionRef::Pooled)
                .map_err(map_sqlx_error),
        }
    }

    /// Persisted categories that differ from their stored state.
    fn changed(&self) -> Vec<ProductCategory> {
        self.dirty
            .values()
            .filter(|category| self.identity_map.get(&category.id) != Some(*category))
            .cloned()
            .collect()
    }

    fn track(&mut self, categories: &[ProductCategory]) {
        for category in categories {
            self.identity_map.insert(category.id, category.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;

    async fn manager() -> EntityManager {
        EntityManager::new(setup_test_database().await.unwrap())
    }

    /// Root with two children ranked 1 and 2.
    async fn seed(em: &mut EntityManager) -> (ProductCategory, Vec<ProductCategory>) {
        em.create(NewProductCategory::new(1));
        let root = em.flush().await.unwrap().remove(0);

        em.create(NewProductCategory::child_of(root.id, 1));
        em.create(NewProductCategory::child_of(root.id, 2));
        let children = em.flush().await.unwrap();
        (root, children)
    }

    #[tokio::test]
    async fn test_nothing_written_before_flush() {
        let mut em = manager().await;
        em.create(NewProductCategory::new(1));

        assert!(em.has_changes());
        assert!(em.fork().find_all().await.unwrap().is_empty());

        let inserted = em.flush().await.unwrap();
        assert_eq!(inserted.len(), 1);
        assert!(em.is_managed(inserted[0].id));
        assert!(!em.has_changes());
    }

    #[tokio::test]
    async fn test_flush_returns_creation_order() {
        let mut em = manager().await;
        let (root, children) = seed(&mut em).await;

        assert!(root.is_root());
        assert_eq!(children[0].rank, 1);
        assert_eq!(children[1].rank, 2);
        assert!(
            children
                .iter()
                .all(|c| c.parent_category_id == Some(root.id))
        );
    }

    #[tokio::test]
    async fn test_flush_without_changes_is_noop() {
        let mut em = manager().await;
        let (root, _) = seed(&mut em).await;

        let loaded = em.find(root.id).await.unwrap().unwrap();
        em.persist(loaded).unwrap();
        assert!(!em.has_changes());
        assert!(em.flush().await.unwrap().is_empty());

        let reloaded = em.fork().find(root.id).await.unwrap();
        assert_eq!(reloaded, Some(root));
    }

    #[tokio::test]
    async fn test_persist_rejects_unmanaged() {
        let mut em = manager().await;
        let (root, _) = seed(&mut em).await;

        let mut fork = em.fork();
        let err = fork.persist(root).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_persisted_changes_are_flushed() {
        let mut em = manager().await;
        let (root, children) = seed(&mut em).await;

        let mut moved = children[1].clone();
        moved.rank = 5;
        em.persist(moved.clone()).unwrap();
        em.flush().await.unwrap();

        let ranks: Vec<i64> = em
            .fork()
            .find_by_parent(Some(root.id))
            .await
            .unwrap()
            .iter()
            .map(|c| c.rank)
            .collect();
        assert_eq!(ranks, vec![1, 5]);
    }

    #[tokio::test]
    async fn test_update_frees_rank_for_insert() {
        let mut em = manager().await;
        let (root, children) = seed(&mut em).await;

        let mut moved = children[0].clone();
        moved.rank = 3;
        em.persist(moved).unwrap();
        em.create(NewProductCategory::child_of(root.id, 1));

        let inserted = em.flush().await.unwrap();
        assert_eq!(inserted[0].rank, 1);
    }

    #[tokio::test]
    async fn test_transactional_swaps_ranks() {
        let mut em = manager().await;
        let (_, children) = seed(&mut em).await;

        em.fork()
            .transactional(async |scope: &mut EntityManager| {
                let mut categories = scope.find_all().await?;
                categories[1].rank = 2;
                scope.persist(categories[1].clone())?;
                categories[2].rank = 1;
                scope.persist(categories[2].clone())?;
                Ok::<_, RepositoryError>(())
            })
            .await
            .unwrap();

        let reloaded = em.fork().find_all().await.unwrap();
        assert_eq!(reloaded[1].id, children[0].id);
        assert_eq!(reloaded[1].rank, 2);
        assert_eq!(reloaded[2].id, children[1].id);
        assert_eq!(reloaded[2].rank, 1);
    }

    #[tokio::test]
    async fn test_transactional_error_writes_nothing() {
        let mut em = manager().await;
        let (root, _) = seed(&mut em).await;

        let result = em
            .transactional(async |scope: &mut EntityManager| {
                scope.create(NewProductCategory::child_of(root.id, 3));
                scope.flush().await?;
                Err::<(), _>(RepositoryError::Storage("abort".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(em.fork().find_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_transactional_constraint_violation_rolls_back() {
        let mut em = manager().await;
        let (root, _) = seed(&mut em).await;

        let err = em
            .transactional(async |scope: &mut EntityManager| {
                scope.create(NewProductCategory::child_of(root.id, 3));
                scope.create(NewProductCategory::child_of(root.id, 3));
                Ok::<_, RepositoryError>(())
            })
            .await
            .unwrap_err();

        assert!(err.is_constraint());
        assert_eq!(em.fork().find_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_flush_in_scope_keeps_earlier_writes() {
        let mut em = manager().await;
        let (root, _) = seed(&mut em).await;

        em.transactional(async |scope: &mut EntityManager| {
            scope.create(NewProductCategory::child_of(root.id, 3));
            scope.flush().await?;

            scope.create(NewProductCategory::child_of(root.id, 3));
            let err = scope.flush().await.unwrap_err();
            assert!(err.is_constraint());
            scope.clear();
            Ok::<_, RepositoryError>(())
        })
        .await
        .unwrap();

        let ranks: Vec<i64> = em
            .fork()
            .find_by_parent(Some(root.id))
            .await
            .unwrap()
            .iter()
            .map(|c| c.rank)
            .collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }
}
