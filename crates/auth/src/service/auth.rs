use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bon::Builder;
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    db::{refresh_token::RefreshTokenRepoRef, user::UserRepoRef},
    model::{
        token::{
            AccessClaims, AuthResponse, LoginRequest, RefreshRequest, RefreshTokenEntry,
            RegisterRequest, TokenResponse,
        },
        user::{Identity, NewUser, User, UserId},
    },
};

use super::{
    password::PasswordHasher,
    token::{TokenError, TokenManager},
};

const REFRESH_TOKEN_BYTES: usize = 64;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Builder)]
pub struct AuthManager<T: TokenManager> {
    users: UserRepoRef,
    refresh_tokens: RefreshTokenRepoRef,
    tokens: T,
    #[builder(default)]
    passwords: PasswordHasher,
    #[builder(into)]
    issuer: String,
    #[builder(into)]
    audience: String,
    #[builder(default = Duration::minutes(15))]
    access_token_duration: Duration,
    #[builder(default = Duration::days(7))]
    refresh_token_duration: Duration,
}

impl<T: TokenManager> AuthManager<T> {
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AuthError> {
        validate_registration(&req)?;

        if self.users.fetch_by_email(&req.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.passwords.hash(req.password).await?;
        let user = self
            .users
            .create(
                NewUser::builder()
                    .email(req.email)
                    .name(req.name)
                    .password_hash(password_hash)
                    .build(),
            )
            .await?
            .ok_or(AuthError::EmailTaken)?;

        info!("Registered user {}", i64::from(user.id));
        self.authenticated(user).await
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .users
            .fetch_by_email(&req.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .passwords
            .verify(req.password, user.password_hash.clone())
            .await?
        {
            debug!("Wrong password for user {}", i64::from(user.id));
            return Err(AuthError::InvalidCredentials);
        }

        self.authenticated(user).await
    }

    /// Trades a refresh token for a new pair. The presented token is consumed
    /// before anything is minted, so it can be used only once.
    pub async fn exchange(&self, req: RefreshRequest) -> Result<TokenResponse, AuthError> {
        if req.refresh_token.is_empty() {
            return Err(AuthError::Validation(
                "Refresh token is required".to_string(),
            ));
        }

        let entry = self
            .refresh_tokens
            .take(&req.refresh_token)
            .await?
            .ok_or(AuthError::InvalidOrExpiredRefreshToken)?;

        if entry.is_expired(Utc::now()) {
            debug!("Expired refresh token for user {}", i64::from(entry.user_id));
            return Err(AuthError::InvalidOrExpiredRefreshToken);
        }

        self.issue_pair(entry.user_id).await
    }

    pub async fn validate(&self, access_token: &str) -> Result<Identity, AuthError> {
        let data = self
            .tokens
            .validate::<AccessClaims>(access_token)
            .map_err(|err| {
                debug!("Rejected access token: {}", err);
                AuthError::InvalidToken
            })?;

        let id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidToken)?;

        self.users
            .fetch_by_id(id.into())
            .await?
            .map(Identity::from)
            .ok_or(AuthError::InvalidToken)
    }

    /// Revokes a refresh token. Unknown tokens are ignored.
    pub async fn logout(&self, req: RefreshRequest) -> Result<(), AuthError> {
        if req.refresh_token.is_empty() {
            return Err(AuthError::Validation(
                "Refresh token is required".to_string(),
            ));
        }
        self.refresh_tokens.delete(&req.refresh_token).await?;
        Ok(())
    }

    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        Ok(self.refresh_tokens.delete_expired(Utc::now()).await?)
    }

    async fn authenticated(&self, user: User) -> Result<AuthResponse, AuthError> {
        let tokens = self.issue_pair(user.id).await?;
        Ok(AuthResponse {
            user: user.into(),
            tokens,
        })
    }

    async fn issue_pair(&self, user_id: UserId) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims::builder()
            .sub(i64::from(user_id).to_string())
            .jti(Uuid::new_v4())
            .iss(self.issuer.clone())
            .aud(self.audience.clone())
            .iat(now.timestamp())
            .exp((now + self.access_token_duration).timestamp())
            .build();

        let access_token = self.tokens.issue(&claims)?;
        let refresh_token = generate_refresh_token()?;

        self.refresh_tokens
            .save(
                RefreshTokenEntry::builder()
                    .token(refresh_token.clone())
                    .user_id(user_id)
                    .expires_at(now + self.refresh_token_duration)
                    .created_at(now)
                    .build(),
            )
            .await?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
        })
    }
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AuthError> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AuthError::Validation("A valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    if req.name.trim().is_empty() {
        return Err(AuthError::Validation("Name is required".to_string()));
    }
    Ok(())
}

fn generate_refresh_token() -> anyhow::Result<String> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| anyhow::anyhow!("Failed to generate refresh token"))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User with this email already exists")]
    EmailTaken,
    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredRefreshToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Generic(#[from] anyhow::Error),
}
