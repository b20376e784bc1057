use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::{UserId, UserView};

/// Opaque refresh token persisted for its owner until used, revoked or expired.
#[derive(Builder, FromRow, Clone, Debug, PartialEq)]
pub struct RefreshTokenEntry {
    #[builder(into)]
    pub token: String,
    #[builder(into)]
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Builder, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccessClaims {
    #[builder(into)]
    pub sub: String,
    pub jti: Uuid,
    #[builder(into)]
    pub iss: String,
    #[builder(into)]
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}
