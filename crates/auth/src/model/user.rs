use bon::Builder;
use chrono::{DateTime, Utc};
use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(From, Into, Serialize, Deserialize, Clone, Copy, Debug, sqlx::Type, PartialEq, Eq)]
#[sqlx(transparent)]
pub struct UserId(i64);

#[derive(FromRow, Clone, Debug, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Builder, Clone, Debug)]
pub struct NewUser {
    #[builder(into)]
    pub email: String,
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub password_hash: String,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

/// Public view of a user, as returned on login and register.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The caller behind a valid access token.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}
