//! Common test utilities.
//!
//! Shared setup for integration tests: environment loading, tracing and a
//! freshly reset database.

use std::sync::Once;

use catrank_db::TestDb;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to `warn`. Run with
/// `RUST_LOG=catrank_db=debug` to see every statement and its parameters.
pub fn init_tracing() {
    TRACING.call_once(|| {
        dotenvy::dotenv().ok();
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Fresh database with the schema reset.
pub async fn setup_test_db() -> TestDb {
    init_tracing();
    TestDb::new().await.expect("Failed to create test database")
}
