mod client;
mod config;
pub mod coordinator;
pub mod error;
pub mod exchange;
pub mod model;
pub mod store;
pub mod transport;

pub use client::SessionClient;
pub use config::{default_base_url, default_refresh_path, default_timeout_secs, SessionCfg};
pub use coordinator::RefreshCoordinator;
pub use error::{ExchangeError, SessionError, SessionResult, TransportError};
pub use model::{ApiRequest, ApiResponse, AuthSession, Profile, SessionEvent, TokenPair};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
