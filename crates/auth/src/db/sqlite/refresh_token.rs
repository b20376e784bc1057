use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{db::refresh_token::RefreshTokenRepo, model::token::RefreshTokenEntry};

#[derive(Clone)]
pub struct SqliteRefreshTokenRepo {
    pool: SqlitePool,
}

impl SqliteRefreshTokenRepo {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = super::connect(url).await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        super::migrate(&self.pool).await
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for SqliteRefreshTokenRepo {
    async fn save(&self, entry: RefreshTokenEntry) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.token)
        .bind(entry.user_id)
        .bind(entry.expires_at)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, token: &str) -> anyhow::Result<Option<RefreshTokenEntry>> {
        sqlx::query_as::<_, RefreshTokenEntry>(
            r#"
            SELECT * FROM refresh_tokens where token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map(Ok)?
    }

    async fn take(&self, token: &str) -> anyhow::Result<Option<RefreshTokenEntry>> {
        sqlx::query_as::<_, RefreshTokenEntry>(
            r#"
            DELETE FROM refresh_tokens where token = $1
            RETURNING *
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map(Ok)?
    }

    async fn delete(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM refresh_tokens where token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens where expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
