//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use oxide_upsert::{Row, ToSqlValue};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing_subscriber::EnvFilter;

/// Opens a single-connection in-memory database.
///
/// Every connection to `sqlite::memory:` is a separate database, so the pool
/// is capped at one connection that is never recycled.
pub async fn memory_pool() -> AnyPool {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    sqlx::any::install_default_drivers();

    AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

/// A pool holding an empty `users (id INTEGER, name TEXT NOT NULL)` table.
///
/// There is no primary key; the bulk strategy must create its own index.
pub async fn users_pool() -> AnyPool {
    let pool = memory_pool().await;
    sqlx::query("CREATE TABLE users (id INTEGER NOT NULL, name TEXT NOT NULL)")
        .execute(&pool)
        .await
        .expect("Failed to create users table");
    pool
}

pub fn user(id: i64, name: &str) -> Row {
    vec![id.to_sql_value(), name.to_sql_value()]
}

/// A user row whose name is NULL, violating the `NOT NULL` constraint.
pub fn nameless(id: i64) -> Row {
    vec![id.to_sql_value(), None::<String>.to_sql_value()]
}

pub async fn fetch_users(pool: &AnyPool) -> Vec<(i64, String)> {
    sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM users ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap()
}

pub async fn count_index(pool: &AnyPool, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = $1",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn owned(rows: &[(i64, &str)]) -> Vec<(i64, String)> {
    rows.iter().map(|(id, name)| (*id, (*name).to_string())).collect()
}
