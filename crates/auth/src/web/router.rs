use axum::{
    routing::{get, post},
    Router,
};

use crate::service::token::TokenManager;

use super::{
    api::{
        auth::{login, logout, me, refresh, register},
        health::health_check,
    },
    state::Context,
};

pub fn auth_app<T: TokenManager + Send + Sync + Clone + 'static>() -> Router<Context<T>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
