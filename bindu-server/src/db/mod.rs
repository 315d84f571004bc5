//! Database module for Bindu Server
//!
//! Contains the Postgres user store and pool setup.

pub mod user;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use user::PgUserStore;

/// Connect a Postgres pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
