//! PostgreSQL package repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::PackageRow;
use crate::repo::{PackageReplacement, PackageRepository};

const PACKAGE_COLUMNS: &str = "id, subscription_id, type_id, quantity, active_since, \
     active_until, created_at, updated_at";

/// PostgreSQL package repository
#[derive(Clone)]
pub struct PgPackageRepository {
    pool: PgPool,
}

impl PgPackageRepository {
    /// Create a new package repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PackageRepository for PgPackageRepository {
    async fn find_active(
        &self,
        subscription_id: Uuid,
        type_id: Uuid,
        at: DateTime<Utc>,
    ) -> DbResult<Option<PackageRow>> {
        // Packages only take effect while the owning subscription's plan
        // stays premium.
        let sql = r#"
            SELECT p.id, p.subscription_id, p.type_id, p.quantity, p.active_since,
                   p.active_until, p.created_at, p.updated_at
            FROM packages p
            JOIN subscriptions s ON s.id = p.subscription_id
            JOIN plans pl ON pl.id = s.plan_id
            WHERE p.subscription_id = $1
              AND p.type_id = $2
              AND pl.is_premium
              AND p.active_since <= $3
              AND (p.active_until IS NULL OR p.active_until >= $3)
            LIMIT 1
            "#;
        let package = sqlx::query_as::<_, PackageRow>(sql)
            .bind(subscription_id)
            .bind(type_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(package)
    }

    async fn find_future(
        &self,
        subscription_id: Uuid,
        type_id: Uuid,
        at: DateTime<Utc>,
    ) -> DbResult<Option<PackageRow>> {
        let sql = r#"
            SELECT p.id, p.subscription_id, p.type_id, p.quantity, p.active_since,
                   p.active_until, p.created_at, p.updated_at
            FROM packages p
            JOIN subscriptions s ON s.id = p.subscription_id
            JOIN plans pl ON pl.id = s.plan_id
            WHERE p.subscription_id = $1
              AND p.type_id = $2
              AND pl.is_premium
              AND p.active_since > $3
            ORDER BY p.active_since
            LIMIT 1
            "#;
        let package = sqlx::query_as::<_, PackageRow>(sql)
            .bind(subscription_id)
            .bind(type_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(package)
    }

    async fn list_for_subscription(&self, subscription_id: Uuid) -> DbResult<Vec<PackageRow>> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages \
             WHERE subscription_id = $1 ORDER BY active_since"
        );
        let packages = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(subscription_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(packages)
    }

    async fn replace_active(
        &self,
        subscription_id: Uuid,
        type_id: Uuid,
        quantity: i64,
        active_since: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> DbResult<PackageReplacement> {
        let mut tx = self.pool.begin().await?;

        // Pending future packages are superseded by this change. They must
        // go before the insert, or the overlap constraint rejects the new
        // period.
        sqlx::query(
            "DELETE FROM packages \
             WHERE subscription_id = $1 AND type_id = $2 AND active_since > $3",
        )
        .bind(subscription_id)
        .bind(type_id)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            SELECT {PACKAGE_COLUMNS} FROM packages
            WHERE subscription_id = $1
              AND type_id = $2
              AND active_since <= $3
              AND (active_until IS NULL OR active_until >= $3)
            FOR UPDATE
            "#
        );
        let active = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(subscription_id)
            .bind(type_id)
            .bind(at)
            .fetch_optional(&mut *tx)
            .await?;

        let closed = match active {
            Some(package) => {
                let sql = format!(
                    "UPDATE packages SET active_until = $1, updated_at = NOW() \
                     WHERE id = $2 RETURNING {PACKAGE_COLUMNS}"
                );
                let row = sqlx::query_as::<_, PackageRow>(&sql)
                    .bind(active_since)
                    .bind(package.id)
                    .fetch_one(&mut *tx)
                    .await?;
                Some(row)
            }
            None => None,
        };

        let created = if quantity > 0 {
            let sql = format!(
                r#"
                INSERT INTO packages (id, subscription_id, type_id, quantity, active_since)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {PACKAGE_COLUMNS}
                "#
            );
            let row = sqlx::query_as::<_, PackageRow>(&sql)
                .bind(Uuid::new_v4())
                .bind(subscription_id)
                .bind(type_id)
                .bind(quantity)
                .bind(active_since)
                .fetch_one(&mut *tx)
                .await?;
            Some(row)
        } else {
            None
        };

        tx.commit().await?;

        Ok(PackageReplacement { closed, created })
    }
}
