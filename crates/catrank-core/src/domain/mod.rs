//! Domain types.

pub mod category;

pub use category::{NewProductCategory, ProductCategory};
