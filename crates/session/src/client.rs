use std::{sync::Arc, time::Duration};

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    config::SessionCfg,
    coordinator::RefreshCoordinator,
    error::{SessionError, SessionResult},
    exchange::{HttpTokenExchange, TokenExchange},
    model::{
        ApiRequest, ApiResponse, AuthSession, LoginRequest, RegisterRequest, SessionEvent,
        TokenPair,
    },
    store::{FileTokenStore, MemoryTokenStore, TokenStore},
    transport::{HttpTransport, Transport},
};

const EVENTS_CAPACITY: usize = 32;

/// Authenticated API client with transparent token refresh.
#[derive(Clone)]
pub struct SessionClient {
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn Transport>,
    coordinator: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionClient {
    pub fn new(
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn Transport>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENTS_CAPACITY);
        let coordinator =
            RefreshCoordinator::spawn(store.clone(), transport.clone(), exchange, events.clone());
        Self {
            store,
            transport,
            coordinator,
            events,
        }
    }

    pub fn from_config(cfg: &SessionCfg) -> SessionResult<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(
            cfg.base_url.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )?);

        let store: Arc<dyn TokenStore> = match &cfg.token_file {
            Some(path) => Arc::new(FileTokenStore::open(path)),
            None => Arc::new(MemoryTokenStore::new()),
        };

        let exchange = Arc::new(HttpTokenExchange::new(
            transport.clone(),
            cfg.refresh_path.clone(),
        ));

        Ok(Self::new(store, transport, exchange))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.store.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.get().is_some()
    }

    pub async fn login(&self, email: &str, password: &str) -> SessionResult<AuthSession> {
        let body = serde_json::to_value(LoginRequest { email, password })?;
        let response = self
            .transport
            .send(&ApiRequest::post("/auth/login", body).anonymous(), None)
            .await?;

        match response.status {
            StatusCode::UNAUTHORIZED => Err(SessionError::InvalidCredentials),
            _ => self.establish(response).await,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> SessionResult<AuthSession> {
        let body = serde_json::to_value(RegisterRequest {
            email,
            password,
            name,
        })?;
        let response = self
            .transport
            .send(&ApiRequest::post("/auth/register", body).anonymous(), None)
            .await?;

        match response.status {
            StatusCode::CONFLICT => Err(SessionError::EmailTaken),
            _ => self.establish(response).await,
        }
    }

    /// Drops the local session and revokes its refresh token, best-effort.
    pub async fn logout(&self) {
        let Some(previous) = self.coordinator.sign_out().await else {
            return;
        };

        let request = ApiRequest::post(
            "/auth/logout",
            json!({ "refreshToken": previous.refresh_token }),
        )
        .anonymous();

        match self.transport.send(&request, None).await {
            Ok(response) if response.status.is_success() => debug!("Refresh token revoked"),
            Ok(response) => warn!("Failed to revoke refresh token: {}", response.status),
            Err(err) => warn!("Failed to revoke refresh token: {}", err),
        }
    }

    /// Sends `request`, refreshing the session once if it is rejected with 401.
    ///
    /// Non-2xx responses are turned into [`SessionError::Api`].
    pub async fn send(&self, request: ApiRequest) -> SessionResult<ApiResponse> {
        let response = self.send_raw(request).await?;
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(SessionError::Api {
                status: response.status,
                message: response.error_message(),
            })
        }
    }

    pub async fn send_raw(&self, request: ApiRequest) -> SessionResult<ApiResponse> {
        if !request.auth {
            return Ok(self.transport.send(&request, None).await?);
        }

        let session = self.coordinator.session();
        let access_token = self.store.get().map(|pair| pair.access_token);
        let response = self
            .transport
            .send(&request, access_token.as_deref())
            .await?;

        if response.is_unauthorized() {
            debug!("{} {} rejected with 401", request.method, request.path);
            self.coordinator
                .request_with_auth(request, access_token, session)
                .await
        } else {
            Ok(response)
        }
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> SessionResult<Option<R>> {
        self.call(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> SessionResult<Option<R>> {
        self.call(ApiRequest::post(path, serde_json::to_value(body)?))
            .await
    }

    pub async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> SessionResult<Option<R>> {
        self.call(ApiRequest::put(path, serde_json::to_value(body)?))
            .await
    }

    pub async fn patch<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> SessionResult<Option<R>> {
        self.call(ApiRequest::patch(path, serde_json::to_value(body)?))
            .await
    }

    pub async fn delete(&self, path: &str) -> SessionResult<()> {
        self.send(ApiRequest::delete(path))
            .await
            .map(|_| ())
    }

    /// `None` for 204 No Content.
    async fn call<R: DeserializeOwned>(&self, request: ApiRequest) -> SessionResult<Option<R>> {
        let response = self.send(request).await?;
        if response.status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    async fn establish(&self, response: ApiResponse) -> SessionResult<AuthSession> {
        if !response.status.is_success() {
            return Err(SessionError::Api {
                status: response.status,
                message: response.error_message(),
            });
        }

        let session = response.json::<AuthSession>()?;
        if !session.tokens.is_complete() {
            return Err(SessionError::Api {
                status: response.status,
                message: "Auth response is missing tokens".to_string(),
            });
        }

        self.coordinator.establish(session.tokens.clone()).await;
        info!("Signed in as {}", session.user.email);
        Ok(session)
    }
}
