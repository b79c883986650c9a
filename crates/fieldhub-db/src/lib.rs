//! FieldHub DB - Database abstractions
//!
//! SQLx-based database layer for FieldHub services.
//!
//! The non-overlap invariants of subscription and package active periods
//! are enforced by PostgreSQL exclusion constraints shipped in
//! `migrations/`; the repositories surface violations as
//! [`DbError::ActivePeriodOverlap`].
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldhub_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/fieldhub").await?;
//! fieldhub_db::run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let account = repos.accounts.find_by_username("alice").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, DbPool, PoolOptions};
pub use repo::*;

/// Run pending migrations from this crate's `migrations/` directory
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
