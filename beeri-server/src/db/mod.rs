//! Database layer - connection pool, schema and repositories
//!
//! - Connection pool with a small fixed limit, no Arc<Mutex<Connection>>
//! - Rely on DB constraints, map violations to typed errors, no check-then-insert
//! - Soft delete for events, per-row deletes where the audit trigger must see each row

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use error::DbError;
pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;

/// Pool for `#[ignore = "requires database"]` tests, migrated on first use.
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    let pool = create_pool(&url).await.expect("connect to test database");
    migrations::run(&pool).await.expect("run migrations");
    pool
}
