use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::{AuthenticatedUser, TokenClaims};
use crate::core::shared::error::{ApiError, ValidationErrors};
use crate::core::shared::state::AppState;
use crate::directory::roles::{self, ROLE_CLIENT};
use crate::directory::users::{self, User};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
}

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(get_current_user))
}

/// Signup. New accounts start with the `client` role.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let mut errors = ValidationErrors::new();
    if req.name.trim().is_empty() {
        errors.add("name", "The name field is required.");
    }
    if req.email.trim().is_empty() {
        errors.add("email", "The email field is required.");
    } else if !req.email.contains('@') {
        errors.add("email", "The email must be a valid email address.");
    }
    if req.password.len() < 8 {
        errors.add("password", "The password must be at least 8 characters.");
    }
    errors.into_result()?;

    let mut conn = state.conn.get()?;

    let email = req.email.trim();
    if users::find_by_email(&mut conn, email)?.is_some() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "The email has already been taken.");
        return Err(ApiError::Validation(errors));
    }

    let user = users::create_user(&mut conn, req.name.trim(), email, &req.password)?;

    if let Some(client_role) = roles::find_by_name(&mut conn, ROLE_CLIENT)? {
        roles::assign_role(&mut conn, user.id, client_role.id)?;
    }

    info!("Registered user {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut conn = state.conn.get()?;

    let user = users::find_by_email(&mut conn, &req.email)?;
    let authenticated = user
        .as_ref()
        .map(|u| users::verify_password(&req.password, &u.password_hash))
        .unwrap_or(false);

    let Some(user) = user.filter(|_| authenticated) else {
        let mut errors = ValidationErrors::new();
        errors.add("email", "These credentials do not match our records.");
        return Err(ApiError::Validation(errors));
    };

    let expires_in = state.config.token_ttl_minutes * 60;
    let token = issue_access_token(
        user.id,
        &state.config.jwt_secret,
        state.config.token_ttl_minutes,
    )?;

    info!("Login for {}", user.email);
    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in,
        user,
    }))
}

pub async fn get_current_user(
    actor: AuthenticatedUser,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    Ok(Json(CurrentUserResponse {
        id: actor.user_id,
        name: actor.name,
        email: actor.email,
        roles: actor.roles,
    }))
}

pub fn issue_access_token(
    user_id: Uuid,
    secret: &str,
    ttl_minutes: i64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token issuance failed: {e}")))
}
