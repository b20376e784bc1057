use async_trait::async_trait;
use wetask_auth::{
    db::{
        sqlite::{self, refresh_token::SqliteRefreshTokenRepo, user::SqliteUserRepo},
        user::UserRepo,
    },
    model::user::UserId,
};

use super::UserFixture;
use crate::{
    generate_refresh_token_store_tests,
    store::{user::new_user, Tester},
};

pub struct SqliteTester {
    users: SqliteUserRepo,
    tokens: SqliteRefreshTokenRepo,
}

#[async_trait]
impl Tester<SqliteRefreshTokenRepo> for SqliteTester {
    async fn create() -> Self {
        let pool = sqlite::connect("sqlite::memory:").await.unwrap();
        sqlite::migrate(&pool).await.unwrap();

        SqliteTester {
            users: SqliteUserRepo::with_pool(pool.clone()),
            tokens: SqliteRefreshTokenRepo::with_pool(pool),
        }
    }

    fn store(&self) -> &SqliteRefreshTokenRepo {
        &self.tokens
    }
}

#[async_trait]
impl UserFixture for SqliteTester {
    async fn seed_user(&self, email: &str) -> UserId {
        self.users.create(new_user(email)).await.unwrap().unwrap().id
    }
}

generate_refresh_token_store_tests!(SqliteTester);
