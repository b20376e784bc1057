use async_trait::async_trait;
use miwa::derive::interface;

#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::model::user::{NewUser, User, UserId};

#[async_trait]
#[interface]
#[cfg_attr(test, automock)]
pub trait UserRepo {
    /// Returns `None` when the email is already registered.
    async fn create(&self, user: NewUser) -> anyhow::Result<Option<User>>;
    async fn fetch_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn fetch_by_id(&self, id: UserId) -> anyhow::Result<Option<User>>;
}
