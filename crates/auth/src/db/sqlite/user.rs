use sqlx::SqlitePool;

use crate::{
    db::user::UserRepo,
    model::user::{NewUser, User, UserId},
};

#[derive(Clone)]
pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
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
impl UserRepo for SqliteUserRepo {
    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user.email)
        .bind(user.name)
        .bind(user.password_hash)
        .bind(user.created_at)
        .fetch_optional(&self.pool)
        .await
        .map(Ok)?
    }

    async fn fetch_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users where email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map(Ok)?
    }

    async fn fetch_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users where id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map(Ok)?
    }
}
