//! Service layer orchestrating the ports.

mod category_service;

pub use category_service::CategoryService;
