use async_trait::async_trait;
use wetask_auth::db::sqlite::user::SqliteUserRepo;

use crate::{generate_user_store_tests, store::Tester};

pub struct SqliteTester(SqliteUserRepo);

#[async_trait]
impl Tester<SqliteUserRepo> for SqliteTester {
    async fn create() -> Self {
        let store = SqliteUserRepo::connect("sqlite::memory:").await.unwrap();

        store.migrate().await.unwrap();
        SqliteTester(store)
    }

    fn store(&self) -> &SqliteUserRepo {
        &self.0
    }
}

generate_user_store_tests!(SqliteTester);
