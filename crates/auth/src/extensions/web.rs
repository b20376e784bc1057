use std::{str::FromStr, sync::Arc, time::Duration as StdDuration};

use chrono::Duration;
use jsonwebtoken::Algorithm;
use miwa::{
    core::{Extension, ExtensionConfig, MiwaResult},
    derive::extension,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    db::{refresh_token::RefreshTokenRepoRef, user::UserRepoRef},
    service::{
        auth::AuthManager,
        password::PasswordHasher,
        token::{TokenManager, TokenManagerImpl},
    },
    web::{self, start_server, state::Context, ServerHandle},
};

use super::config::AuthCfg;

pub struct AuthApiExtension {
    cfg: AuthCfg,
    ctx: Context<TokenManagerImpl>,
    handle: Arc<Mutex<Option<ServerHandle>>>,
    purger: Arc<Mutex<Option<JoinHandle<()>>>>,
}

#[async_trait::async_trait]
impl Extension for AuthApiExtension {
    async fn start(&self) -> MiwaResult<()> {
        let server = start_server(
            self.cfg.bind,
            self.cfg.port,
            web::auth_app(),
            self.ctx.clone(),
            "Auth API",
        )
        .await?;

        self.handle.lock().await.replace(server);

        let purger = spawn_purger(
            self.ctx.auth().clone(),
            StdDuration::from_secs(self.cfg.purge_interval),
        );
        self.purger.lock().await.replace(purger);
        Ok(())
    }

    async fn shutdown(&self) -> MiwaResult<()> {
        if let Some(purger) = self.purger.lock().await.take() {
            purger.abort();
        }
        if let Some(server) = self.handle.lock().await.take() {
            server.shutdown();
        }
        Ok(())
    }
}

#[extension(name = "Auth api extension")]
pub async fn auth_api_extension(
    ExtensionConfig(cfg): ExtensionConfig<AuthCfg>,
    users: UserRepoRef,
    refresh_tokens: RefreshTokenRepoRef,
) -> MiwaResult<AuthApiExtension> {
    let tokens = create_token_manager(cfg.clone())?;
    let auth = create_auth_manager(cfg.clone(), users, refresh_tokens, tokens)?;

    Ok(AuthApiExtension {
        cfg,
        ctx: Context::new(auth),
        handle: Arc::default(),
        purger: Arc::default(),
    })
}

pub fn create_token_manager(cfg: AuthCfg) -> anyhow::Result<TokenManagerImpl> {
    Ok(TokenManagerImpl::builder()
        .encoding_key(cfg.keys.private_key)
        .maybe_decoding_key(cfg.keys.public_key)
        .algorithm(Algorithm::from_str(&cfg.keys.algorithm)?)
        .audience(cfg.audience)
        .issuer(cfg.issuer)
        .maybe_kid(cfg.keys.kid)
        .format(cfg.keys.format)
        .leeway(cfg.token_leeway)
        .build())
}

pub fn create_auth_manager<T: TokenManager>(
    cfg: AuthCfg,
    users: UserRepoRef,
    refresh_tokens: RefreshTokenRepoRef,
    tokens: T,
) -> anyhow::Result<AuthManager<T>> {
    Ok(AuthManager::builder()
        .users(users)
        .refresh_tokens(refresh_tokens)
        .tokens(tokens)
        .passwords(PasswordHasher::new(cfg.bcrypt_cost))
        .issuer(cfg.issuer)
        .audience(cfg.audience)
        .access_token_duration(seconds("auth.access_token_duration", cfg.access_token_duration)?)
        .refresh_token_duration(seconds("auth.refresh_token_duration", cfg.refresh_token_duration)?)
        .build())
}

fn seconds(key: &str, value: u64) -> anyhow::Result<Duration> {
    i64::try_from(value)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| anyhow::anyhow!("{} is out of range: {}", key, value))
}

fn spawn_purger(auth: AuthManager<TokenManagerImpl>, every: StdDuration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(StdDuration::from_secs(1)));
        loop {
            interval.tick().await;
            match auth.purge_expired().await {
                Ok(0) => {}
                Ok(count) => info!("Purged {} expired refresh tokens", count),
                Err(err) => warn!("Failed to purge expired refresh tokens: {}", err),
            }
        }
    })
}
