//! PostgreSQL package type repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use fieldhub_types::PackageKind;

use crate::error::DbResult;
use crate::models::PackageTypeRow;
use crate::repo::PackageTypeRepository;

const PACKAGE_TYPE_COLUMNS: &str = "id, code, display_name, kind, is_public, min_quantity, \
     max_quantity, unit_amount, unit_label, created_at, updated_at";

/// PostgreSQL package type repository
#[derive(Clone)]
pub struct PgPackageTypeRepository {
    pool: PgPool,
}

impl PgPackageTypeRepository {
    /// Create a new package type repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PackageTypeRepository for PgPackageTypeRepository {
    async fn find_by_kind(&self, kind: PackageKind) -> DbResult<Option<PackageTypeRow>> {
        let sql = format!("SELECT {PACKAGE_TYPE_COLUMNS} FROM package_types WHERE kind = $1");
        let package_type = sqlx::query_as::<_, PackageTypeRow>(&sql)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(package_type)
    }

    async fn get_or_create_storage(&self) -> DbResult<PackageTypeRow> {
        if let Some(row) = self.find_by_kind(PackageKind::Storage).await? {
            return Ok(row);
        }

        // Two concurrent seeders race on the unique kind; the loser reads
        // the winner's row.
        let sql = format!(
            r#"
            INSERT INTO package_types (id, code, display_name, kind, min_quantity,
                                       max_quantity, unit_amount, unit_label)
            VALUES ($1, 'storage_package', 'Storage', $2, 0, 100, 1000, 'MB')
            ON CONFLICT (kind) DO NOTHING
            RETURNING {PACKAGE_TYPE_COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, PackageTypeRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(PackageKind::Storage.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match inserted {
            Some(row) => Ok(row),
            None => {
                let row = self.find_by_kind(PackageKind::Storage).await?;
                row.ok_or(crate::error::DbError::NotFound)
            }
        }
    }

    async fn list_all(&self) -> DbResult<Vec<PackageTypeRow>> {
        let sql = format!("SELECT {PACKAGE_TYPE_COLUMNS} FROM package_types ORDER BY code");
        let rows = sqlx::query_as::<_, PackageTypeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
