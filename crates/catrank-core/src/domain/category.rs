//! Product category domain types.
//!
//! Categories form a tree through `parent_category_id`. Siblings (categories
//! sharing a parent, including all roots) are ordered by `rank`, and no two
//! siblings may hold the same rank at the same time.

use serde::{Deserialize, Serialize};

/// A persisted product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    /// Database ID, assigned on insert.
    pub id: i64,
    /// Ordering among siblings.
    pub rank: i64,
    /// Parent category, `None` for a root category.
    pub parent_category_id: Option<i64>,
}

impl ProductCategory {
    /// Whether this category has no parent.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_category_id.is_none()
    }

    /// Whether `other` shares this category's parent.
    ///
    /// Roots are siblings of each other. A category is not its own sibling.
    #[must_use]
    pub fn is_sibling_of(&self, other: &Self) -> bool {
        self.id != other.id && self.parent_category_id == other.parent_category_id
    }
}

/// A category that has not been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductCategory {
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub parent_category_id: Option<i64>,
}

impl NewProductCategory {
    /// A root category with the given rank.
    #[must_use]
    pub const fn new(rank: i64) -> Self {
        Self {
            rank,
            parent_category_id: None,
        }
    }

    /// A child of `parent_id` with the given rank.
    #[must_use]
    pub const fn child_of(parent_id: i64, rank: i64) -> Self {
        Self {
            rank,
            parent_category_id: Some(parent_id),
        }
    }

    /// Attach the database-assigned ID.
    #[must_use]
    pub const fn with_id(self, id: i64) -> ProductCategory {
        ProductCategory {
            id,
            rank: self.rank,
            parent_category_id: self.parent_category_id,
        }
    }
}
