use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

pub const ROLE_CUSTOMER: &str = "CUSTOMER";
pub const ROLE_ADMIN: &str = "ADMIN";

pub const TOKEN_USE_ACCESS: &str = "access";
pub const TOKEN_USE_REFRESH: &str = "refresh";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub role: String,
    /// "access" or "refresh".
    pub token_use: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, StatusCode> {
        Uuid::parse_str(&self.sub).map_err(|_| StatusCode::UNAUTHORIZED)
    }
}

fn decode_bearer(req: &Request, secret: &str) -> Result<Claims, StatusCode> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(token_data.claims)
}

// ============================================================================
// Authenticated-user middleware
// ============================================================================

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = decode_bearer(&req, &state.auth.secret)?;

    // Refresh tokens cannot be used to call the API.
    if claims.token_use != TOKEN_USE_ACCESS {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// ============================================================================
// Admin middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let claims = decode_bearer(&req, &state.auth.secret)?;

    if claims.token_use != TOKEN_USE_ACCESS {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if claims.role != ROLE_ADMIN {
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn test_claims_round_trip() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "alice".into(),
            role: ROLE_CUSTOMER.into(),
            token_use: TOKEN_USE_ACCESS.into(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.username, "alice");
        assert!(decoded.claims.user_id().is_ok());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "mallory".into(),
            role: ROLE_ADMIN.into(),
            token_use: TOKEN_USE_ACCESS.into(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret-a"),
        )
        .unwrap();
        assert!(decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret-b"),
            &Validation::default(),
        )
        .is_err());
    }
}
