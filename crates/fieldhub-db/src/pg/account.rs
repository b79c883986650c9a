//! PostgreSQL account repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::AccountRow;
use crate::repo::{AccountRepository, CreateAccount};

/// PostgreSQL account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a new account repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<AccountRow>> {
        let account = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, category, storage_used_mb, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> DbResult<Option<AccountRow>> {
        let account = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, category, storage_used_mb, created_at, updated_at
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn create(&self, account: CreateAccount) -> DbResult<AccountRow> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (id, username, category)
            VALUES ($1, $2, $3)
            RETURNING id, username, category, storage_used_mb, created_at, updated_at
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(account.category.code())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_storage_used_mb(&self, id: Uuid, storage_used_mb: i64) -> DbResult<()> {
        sqlx::query(
            "UPDATE accounts SET storage_used_mb = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(storage_used_mb)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
