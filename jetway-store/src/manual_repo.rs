use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use jetway_core::manual::Manual;
use jetway_core::repository::ManualRepository;
use jetway_core::StoreResult;

use crate::database::backend;

pub struct PostgresManualRepository {
    pool: PgPool,
}

impl PostgresManualRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ManualRow {
    content: String,
    last_updated: Option<DateTime<Utc>>,
    updated_by: Option<Uuid>,
}

#[async_trait]
impl ManualRepository for PostgresManualRepository {
    async fn get_manual(&self) -> StoreResult<Option<Manual>> {
        let row = sqlx::query_as::<_, ManualRow>("SELECT content, last_updated, updated_by FROM manual WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        Ok(row.map(|r| Manual {
            content: r.content,
            last_updated: r.last_updated,
            updated_by: r.updated_by,
        }))
    }

    async fn save_manual(&self, manual: &Manual) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO manual (id, content, last_updated, updated_by)
            VALUES (1, $1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET content = EXCLUDED.content, last_updated = EXCLUDED.last_updated, updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(&manual.content)
        .bind(manual.last_updated)
        .bind(manual.updated_by)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }
}
