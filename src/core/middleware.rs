use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::error::ApiError;
use crate::core::shared::state::AppState;
use crate::directory::{roles, users};

/// Paths reachable without a bearer token.
const ANONYMOUS_PATHS: &[&str] = &["/health", "/api/auth/login", "/api/auth/register"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated actor extracted from the request.
///
/// Role names are loaded once per request from the role directory, so policy
/// checks downstream are pure lookups over this snapshot.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// True iff the user's role set intersects the requested set.
    pub fn has_any_role(&self, requested: &[&str]) -> bool {
        requested.iter().any(|role| self.has_role(role))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}

pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if ANONYMOUS_PATHS.contains(&path) {
        return next.run(req).await;
    }

    let user = match authenticate(&state, &req) {
        Ok(user) => user,
        Err(err) => {
            log::warn!("Authentication failed for {}: {}", path, err);
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "Unauthenticated." })),
            )
                .into_response();
        }
    };

    req.extensions_mut().insert(user);
    next.run(req).await
}

fn authenticate(state: &AppState, req: &Request) -> Result<AuthenticatedUser, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    let claims = validate_jwt(token, &state.config.jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthError::InvalidToken("Invalid user ID".to_string()))?;

    let mut conn = state
        .conn
        .get()
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let user = users::find_by_id(&mut conn, user_id)
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .ok_or_else(|| AuthError::InvalidToken("Unknown user".to_string()))?;
    let roles = roles::user_roles(&mut conn, user_id)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        name: user.name,
        roles,
    })
}

/// Validate a JWT token and extract its claims.
fn validate_jwt(token: &str, secret: &str) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["sub", "exp"]);

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    match decode::<TokenClaims>(token, &decoding_key, &validation) {
        Ok(token_data) => Ok(token_data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(AuthError::TokenExpired),
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                Err(AuthError::InvalidToken("Malformed token".to_string()))
            }
            _ => Err(AuthError::InvalidToken(format!(
                "Token validation failed: {}",
                e
            ))),
        },
    }
}

#[derive(Debug)]
enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken(String),
    TokenExpired,
    Internal(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "Missing authorization token"),
            Self::InvalidFormat => write!(f, "Invalid authorization format"),
            Self::InvalidToken(msg) => write!(f, "Invalid token: {msg}"),
            Self::TokenExpired => write!(f, "Token expired"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_roles(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: "User".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_has_role_single_name() {
        let user = user_with_roles(&["client"]);
        assert!(user.has_role("client"));
        assert!(!user.has_role("agent"));
        assert!(!user.has_role("admin"));
    }

    #[test]
    fn test_has_any_role_intersects_sets() {
        let user = user_with_roles(&["agent"]);
        assert!(user.has_any_role(&["agent", "admin"]));
        assert!(user.has_any_role(&["client", "agent"]));
        assert!(!user.has_any_role(&["client", "admin"]));
    }

    #[test]
    fn test_no_roles_yields_false() {
        let user = user_with_roles(&[]);
        assert!(!user.has_role("client"));
        assert!(!user.has_any_role(&["client", "agent", "admin"]));
    }

    #[test]
    fn test_multiple_roles() {
        let user = user_with_roles(&["client", "agent"]);
        assert!(user.has_role("client"));
        assert!(user.has_role("agent"));
        assert!(user.has_any_role(&["admin", "agent"]));
    }
}
