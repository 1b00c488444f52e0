//! The persistence layer (M): a single pooled async Postgres client backing the Token
//! Metadata Cache, Pair Admission Store, Strategy Catalog & Chain State, Nonce Allocator,
//! and Quote Record store. Schema creation is handled by embedded migrations run once at
//! startup; there is no ORM, each table maps 1:1 to a hand-written typed query.

pub mod nonce;
pub mod pairs;
pub mod quotes;
pub mod strategies;
pub mod tokens;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Opens the pool and waits for at least one connection to be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Runs the embedded migrations. Idempotent; safe to call on every startup.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
