//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use fieldhub_types::SubscriptionStatus;

use crate::error::{DbError, DbResult};
use crate::models::SubscriptionRow;
use crate::repo::{CreateSubscription, SubscriptionChange, SubscriptionRepository};

const SUBSCRIPTION_COLUMNS: &str = "id, account_id, plan_id, status, requested_cancel_at, \
     active_since, active_until, billing_cycle_anchor_at, current_period_since, \
     current_period_until, created_at, updated_at";

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1");
        let sub = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sub)
    }

    async fn find_active_for_account(
        &self,
        account_id: Uuid,
        at: DateTime<Utc>,
    ) -> DbResult<Option<SubscriptionRow>> {
        let sql = format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE account_id = $1
              AND active_since IS NOT NULL
              AND active_since <= $2
              AND (active_until IS NULL OR active_until >= $2)
            LIMIT 1
            "#
        );
        let sub = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(account_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sub)
    }

    async fn list_for_account(&self, account_id: Uuid) -> DbResult<Vec<SubscriptionRow>> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             WHERE account_id = $1 ORDER BY created_at DESC"
        );
        let subs = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(subs)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let sql = format!(
            r#"
            INSERT INTO subscriptions (id, account_id, plan_id, status, active_since, active_until)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(sub.id)
            .bind(sub.account_id)
            .bind(sub.plan_id)
            .bind(sub.status.as_str())
            .bind(sub.active_since)
            .bind(sub.active_until)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update_status(&self, id: Uuid, status: SubscriptionStatus) -> DbResult<()> {
        sqlx::query("UPDATE subscriptions SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_exclusive(
        &self,
        id: Uuid,
        change: SubscriptionChange,
        at: DateTime<Utc>,
    ) -> DbResult<SubscriptionRow> {
        let mut tx = self.pool.begin().await?;

        // Serialize competing updates on the target row.
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1 FOR UPDATE");
        let target = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        // Close out every other subscription of the account that is active
        // at `at`; its period ends where the target's new period begins.
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET active_until = $1, status = $2, updated_at = NOW()
            WHERE account_id = $3
              AND id <> $4
              AND active_since IS NOT NULL
              AND active_since <= $5
              AND (active_until IS NULL OR active_until >= $5)
            "#,
        )
        .bind(change.active_since.unwrap_or(at))
        .bind(SubscriptionStatus::InactiveCancelled.as_str())
        .bind(target.account_id)
        .bind(id)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            UPDATE subscriptions
            SET status = $2,
                active_since = $3,
                active_until = $4,
                requested_cancel_at = $5,
                billing_cycle_anchor_at = $6,
                current_period_since = $7,
                current_period_until = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(id)
            .bind(change.status.as_str())
            .bind(change.active_since)
            .bind(change.active_until)
            .bind(change.requested_cancel_at)
            .bind(change.billing_cycle_anchor_at)
            .bind(change.current_period_since)
            .bind(change.current_period_until)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row)
    }
}
