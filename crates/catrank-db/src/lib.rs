//! `SQLite` adapter for catrank.
//!
//! Provides schema setup, the [`SqliteCategoryRepository`] port
//! implementation and the [`EntityManager`] unit of work used to batch
//! category writes into transactions.

#![deny(unsafe_code)]

pub mod entity_manager;
pub mod factory;
pub mod repositories;
pub mod setup;

pub use entity_manager::EntityManager;

// Re-export factory for convenient access
pub use factory::CoreFactory;

// Re-export TestDb for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub use factory::TestDb;

pub use repositories::SqliteCategoryRepository;

// Re-export setup functions for convenient access
pub use setup::{refresh_schema, setup_database};
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
