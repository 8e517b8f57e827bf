//! Core domain types and port definitions for catrank.
//!
//! This crate holds the product category model, the repository port that
//! storage adapters implement, and the services that orchestrate them.
//! Nothing here depends on `sqlx`; the `SQLite` adapter lives in `catrank-db`.

pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{ConfigError, DEFAULT_DB_NAME, DatabaseConfig};
pub use domain::{NewProductCategory, ProductCategory};
pub use ports::{CategoryRepository, RepositoryError};
pub use services::CategoryService;
