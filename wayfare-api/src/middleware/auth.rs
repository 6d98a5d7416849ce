use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use wayfare_core::identity::{Role, User};
use wayfare_core::UserId;

use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: UserId,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user.id,
        email: user.email.expose().clone(),
        role: user.role,
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.expose().as_bytes()),
    )
}

fn verify(auth: &AuthConfig, token: &str) -> Result<Claims, StatusCode> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.expose().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Claims from the `Authorization: Bearer` header. Missing or invalid: 401.
fn bearer_claims(auth: &AuthConfig, req: &Request) -> Result<Claims, StatusCode> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    verify(auth, token)
}

// ============================================================================
// Customer Authentication Middleware
// ============================================================================

/// Any valid token. Claims are injected into the request extensions.
pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = bearer_claims(&state.auth, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = bearer_claims(&state.auth, &req)?;
    if !claims.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_shared::Masked;

    fn auth() -> AuthConfig {
        AuthConfig {
            secret: Masked("test-secret".to_string()),
            expiration: 60,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let user = User::new("Ada".into(), "ada@example.com".into(), "h".into(), Role::Admin);
        let token = issue_token(&auth(), &user).unwrap();
        let claims = verify(&auth(), &token).unwrap();
        assert_eq!(claims.user_id(), user.id);
        assert!(claims.is_admin());
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let user = User::new("Ada".into(), "ada@example.com".into(), "h".into(), Role::User);
        let token = issue_token(&auth(), &user).unwrap();
        let other = AuthConfig {
            secret: Masked("other".to_string()),
            expiration: 60,
        };
        assert_eq!(verify(&other, &token).unwrap_err(), StatusCode::UNAUTHORIZED);
    }
}
