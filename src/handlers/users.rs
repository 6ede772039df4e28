use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

use crate::{
    auth::{
        jwt::{CurrentUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
        tokens::TokenPair,
    },
    dto::users::{
        ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse,
        RegisterRequest, RegisterResponse, UpdateAccountRequest,
    },
    errors::AppError,
    models::user::UserPublic,
    services::user_service,
    state::AppState,
};

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

fn with_session_cookies(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
    ))
}

fn without_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/").build())
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/").build())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = user_service::register(&state, req).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let (user, tokens) = user_service::login(&state, req).await?;
    let jar = with_session_cookies(jar, &tokens);

    Ok((
        jar,
        Json(LoginResponse {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }),
    ))
}

pub async fn refresh_access(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<RefreshResponse>), AppError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body.and_then(|Json(req)| req.refresh_token))
        .ok_or(AppError::Unauthenticated)?;

    let tokens = user_service::refresh_session(&state, &presented).await?;
    let jar = with_session_cookies(jar, &tokens);

    Ok((
        jar,
        Json(RefreshResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), AppError> {
    user_service::logout(&state, user.id).await?;

    Ok((
        without_session_cookies(jar),
        Json(serde_json::json!({ "success": true, "message": "logged out" })),
    ))
}

pub async fn user_details(user: CurrentUser) -> Json<UserPublic> {
    Json(user.profile)
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    user_service::change_password(&state, user.id, req).await?;

    Ok(Json(
        serde_json::json!({ "success": true, "message": "password changed" }),
    ))
}

pub async fn update_account_details(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<UserPublic>, AppError> {
    let updated = user_service::update_account(&state, user.id, req).await?;
    Ok(Json(updated))
}
