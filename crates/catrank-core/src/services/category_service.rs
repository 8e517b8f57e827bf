//! Category service - thin orchestrator for category ranking.
//!
//! Persistence is delegated to the `CategoryRepository` port. The service
//! only adds the sibling checks that belong above the storage layer.

use std::sync::Arc;

use crate::domain::{NewProductCategory, ProductCategory};
use crate::ports::{CategoryRepository, RepositoryError};

/// Service for creating and reordering product categories.
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    /// Create a new category service.
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// Create a root category.
    pub async fn create_root(&self, rank: i64) -> Result<ProductCategory, RepositoryError> {
        self.repo.insert(NewProductCategory::new(rank)).await
    }

    /// Create children of `parent_id`, one per rank, in a single batch.
    pub async fn create_children(
        &self,
        parent_id: i64,
        ranks: &[i64],
    ) -> Result<Vec<ProductCategory>, RepositoryError> {
        if self.repo.get(parent_id).await?.is_none() {
            return Err(RepositoryError::NotFound(format!("category id={parent_id}")));
        }

        let children = ranks
            .iter()
            .map(|&rank| NewProductCategory::child_of(parent_id, rank))
            .collect();
        self.repo.insert_batch(children).await
    }

    /// Children of `parent` (roots when `None`), ordered by rank.
    pub async fn children(
        &self,
        parent: Option<i64>,
    ) -> Result<Vec<ProductCategory>, RepositoryError> {
        self.repo.list_children(parent).await
    }

    /// Swap the ranks of two sibling categories atomically.
    ///
    /// Returns both categories as stored after the swap.
    pub async fn swap_ranks(
        &self,
        a: i64,
        b: i64,
    ) -> Result<(ProductCategory, ProductCategory), RepositoryError> {
        let mut first = self.require(a).await?;
        let mut second = self.require(b).await?;

        if !first.is_sibling_of(&second) {
            return Err(RepositoryError::Constraint(format!(
                "categories {a} and {b} are not siblings"
            )));
        }

        std::mem::swap(&mut first.rank, &mut second.rank);
        tracing::debug!(a, b, "Swapping category ranks");
        self.repo
            .update_batch(vec![first.clone(), second.clone()])
            .await?;

        Ok((first, second))
    }

    async fn require(&self, id: i64) -> Result<ProductCategory, RepositoryError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("category id={id}")))
    }
}
