use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miwa::derive::interface;

#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::model::token::RefreshTokenEntry;

#[async_trait]
#[interface]
#[cfg_attr(test, automock)]
pub trait RefreshTokenRepo {
    async fn save(&self, entry: RefreshTokenEntry) -> anyhow::Result<()>;
    async fn fetch(&self, token: &str) -> anyhow::Result<Option<RefreshTokenEntry>>;
    /// Removes the entry and hands it back. Only one concurrent caller gets `Some`.
    async fn take(&self, token: &str) -> anyhow::Result<Option<RefreshTokenEntry>>;
    async fn delete(&self, token: &str) -> anyhow::Result<()>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> anyhow::Result<u64>;
}
