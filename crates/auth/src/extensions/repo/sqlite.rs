use miwa::{
    core::{Extension, ExtensionConfig, MiwaContext, MiwaResult},
    derive::{extension, ExtensionConfig},
};
use serde::Deserialize;

use crate::db::{
    refresh_token::RefreshTokenRepoRef,
    sqlite::{self, refresh_token::SqliteRefreshTokenRepo, user::SqliteUserRepo},
    user::UserRepoRef,
};

pub struct SqliteRepoExtension {}

#[async_trait::async_trait]
impl Extension for SqliteRepoExtension {
    async fn start(&self) -> MiwaResult<()> {
        Ok(())
    }

    async fn shutdown(&self) -> MiwaResult<()> {
        Ok(())
    }
}

#[derive(Deserialize, ExtensionConfig)]
#[config(prefix = "db.auth")]
#[serde(rename_all = "lowercase")]
pub enum AuthDbConfig {
    Sqlite { path: String },
}

#[extension(
    name = "Sqlite store extensions for auth",
    provides(UserRepoRef, RefreshTokenRepoRef)
)]
pub async fn auth_sql_repo_extension(
    ctx: &MiwaContext,
    ExtensionConfig(cfg): ExtensionConfig<AuthDbConfig>,
) -> MiwaResult<SqliteRepoExtension> {
    let (users, refresh_tokens) = create_stores(cfg).await?;
    ctx.register(users);
    ctx.register(refresh_tokens);
    Ok(SqliteRepoExtension {})
}

async fn create_stores(cfg: AuthDbConfig) -> anyhow::Result<(UserRepoRef, RefreshTokenRepoRef)> {
    match cfg {
        AuthDbConfig::Sqlite { path } => {
            let pool = sqlite::connect(&format!("sqlite:{}", path)).await?;
            sqlite::migrate(&pool).await?;

            Ok((
                UserRepoRef::of(SqliteUserRepo::with_pool(pool.clone())),
                RefreshTokenRepoRef::of(SqliteRefreshTokenRepo::with_pool(pool)),
            ))
        }
    }
}
