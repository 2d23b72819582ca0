use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use campus_db::models::User;
use campus_services::auth::TokenPair;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub domain: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub username: String,
    pub display_name: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub domain: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub domain: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
}

impl UserResponse {
    fn from_user(user: User) -> Result<Self, ApiError> {
        let id = user
            .id
            .ok_or_else(|| ApiError::Internal("User has no id".to_string()))?;
        Ok(Self {
            id: id.to_hex(),
            domain: user.domain.to_hex(),
            email: user.email,
            username: user.username,
            display_name: user.display_name,
        })
    }
}

fn session_cookie(tokens: &TokenPair) -> Result<HeaderMap, ApiError> {
    let cookie = format!(
        "access_token={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        tokens.access_token, tokens.expires_in
    );
    let value = HeaderValue::from_str(&cookie).map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

fn respond(user: User, tokens: TokenPair) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let headers = session_cookie(&tokens)?;
    Ok((
        headers,
        Json(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            user: UserResponse::from_user(user)?,
        }),
    ))
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), ApiError> {
    body.validate()?;

    let domain = state.domains.find_or_create(body.domain.trim()).await?;
    let domain_id = domain
        .id
        .ok_or_else(|| ApiError::Internal("Domain has no id".to_string()))?;
    let password_hash = state.auth.hash_password(&body.password)?;

    let user = state
        .users
        .create(
            domain_id,
            body.email.to_lowercase(),
            body.username,
            body.display_name,
            password_hash,
        )
        .await?;
    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("User has no id".to_string()))?;

    info!(%user_id, domain = %domain.name, "User registered");
    let tokens = state.auth.generate_tokens(user_id, domain_id, &user.email)?;
    let (headers, body) = respond(user, tokens)?;
    Ok((StatusCode::CREATED, headers, body))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let domain = state
        .domains
        .find_by_name(body.domain.trim())
        .await
        .map_err(|_| invalid())?;
    let domain_id = domain.id.ok_or_else(invalid)?;

    let user = state
        .users
        .find_by_email(domain_id, &body.email.to_lowercase())
        .await
        .map_err(|_| invalid())?;
    let password_hash = user.password_hash.as_deref().ok_or_else(invalid)?;

    if !state.auth.verify_password(&body.password, password_hash)? {
        return Err(invalid());
    }

    let user_id = user.id.ok_or_else(invalid)?;
    let tokens = state.auth.generate_tokens(user_id, domain_id, &user.email)?;
    respond(user, tokens)
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_in_domain(auth.domain, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from_user(user)?))
}
