use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    model::{
        token::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse},
        user::Identity,
    },
    service::{auth::AuthError, token::TokenManager},
    web::{error::AuthResult, state::Context},
};

pub async fn register<T: TokenManager + Clone>(
    State(ctx): State<Context<T>>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)> {
    let Json(request) = request?;
    ctx.auth()
        .register(request)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)))
}

pub async fn login<T: TokenManager + Clone>(
    State(ctx): State<Context<T>>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<Json<AuthResponse>> {
    let Json(request) = request?;
    ctx.auth().login(request).await.map(Json)
}

pub async fn refresh<T: TokenManager + Clone>(
    State(ctx): State<Context<T>>,
    request: Result<Json<RefreshRequest>, JsonRejection>,
) -> AuthResult<Json<TokenResponse>> {
    let Json(request) = request?;
    ctx.auth().exchange(request).await.map(Json)
}

pub async fn logout<T: TokenManager + Clone>(
    State(ctx): State<Context<T>>,
    request: Result<Json<RefreshRequest>, JsonRejection>,
) -> AuthResult<StatusCode> {
    let Json(request) = request?;
    ctx.auth().logout(request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me<T: TokenManager + Clone>(
    State(ctx): State<Context<T>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> AuthResult<Json<Identity>> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::InvalidToken)?;
    ctx.auth().validate(bearer.token()).await.map(Json)
}
