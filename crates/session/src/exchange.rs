use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;

#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::{
    error::ExchangeError,
    model::{ApiRequest, RefreshRequest, TokenPair},
    transport::Transport,
};

/// Trades a refresh token for a brand new pair.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, refresh_token: String) -> Result<TokenPair, ExchangeError>;
}

pub struct HttpTokenExchange {
    transport: Arc<dyn Transport>,
    path: String,
}

impl HttpTokenExchange {
    pub fn new(transport: Arc<dyn Transport>, path: impl Into<String>) -> Self {
        Self {
            transport,
            path: path.into(),
        }
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange(&self, refresh_token: String) -> Result<TokenPair, ExchangeError> {
        if refresh_token.is_empty() {
            return Err(ExchangeError::MissingRefreshToken);
        }

        let request = ApiRequest::builder()
            .method(Method::POST)
            .path(self.path.clone())
            .body(serde_json::to_value(RefreshRequest {
                refresh_token: &refresh_token,
            })?)
            .auth(false)
            .build();

        let response = self.transport.send(&request, None).await?;

        if !response.status.is_success() {
            return Err(ExchangeError::Rejected(response.status));
        }

        let pair = response.json::<TokenPair>()?;
        if !pair.is_complete() {
            return Err(ExchangeError::Malformed);
        }
        Ok(pair)
    }
}
