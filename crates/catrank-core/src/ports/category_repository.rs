//! Category repository port definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{NewProductCategory, ProductCategory};

/// Port for product category persistence.
///
/// Implementations must keep `(parent_category_id, rank)` unique and report
/// violations as [`RepositoryError::Constraint`].
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a single category and return it with its assigned ID.
    async fn insert(&self, category: NewProductCategory)
    -> Result<ProductCategory, RepositoryError>;

    /// Insert several categories atomically.
    ///
    /// Results are returned in input order. Either all rows are written or none.
    async fn insert_batch(
        &self,
        categories: Vec<NewProductCategory>,
    ) -> Result<Vec<ProductCategory>, RepositoryError>;

    /// Get a category by ID.
    async fn get(&self, id: i64) -> Result<Option<ProductCategory>, RepositoryError>;

    /// List all categories, ordered by ID.
    async fn list(&self) -> Result<Vec<ProductCategory>, RepositoryError>;

    /// List the children of `parent` (roots when `None`), ordered by rank.
    async fn list_children(
        &self,
        parent: Option<i64>,
    ) -> Result<Vec<ProductCategory>, RepositoryError>;

    /// Write rank and parent of existing categories atomically.
    ///
    /// Permutations of ranks among siblings must succeed even though every
    /// intermediate single-row state would collide.
    async fn update_batch(&self, categories: Vec<ProductCategory>) -> Result<(), RepositoryError>;

    /// Count stored categories.
    async fn count(&self) -> Result<i64, RepositoryError>;
}
