use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use skylane_core::user::User;
use skylane_store::NewUser;

use crate::error::AppError;
use crate::mailer::EmailJob;
use crate::middleware::auth::{Claims, ROLE_ADMIN, ROLE_CUSTOMER, TOKEN_USE_ACCESS, TOKEN_USE_REFRESH};
use crate::state::{AppState, AuthConfig};

const MIN_PASSWORD_LENGTH: usize = 8;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/token/refresh", post(refresh_token))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: uuid::Uuid,
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    status: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            status: user.status.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh: String,
}

/// POST /api/auth/register
///
/// New accounts always start as `pending`; an admin has to approve them
/// before login succeeds.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), AppError> {
    if req.username.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::ValidationDetail(
            "username and email are required".to_string(),
            json!({"fields": ["username", "email"]}),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::ValidationDetail(
            "email address is not valid".to_string(),
            json!({"fields": ["email"]}),
        ));
    }
    if req.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::ValidationDetail(
            format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
            json!({"fields": ["password"]}),
        ));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("password hashing failed: {e}")))?;

    let user = state
        .users
        .create(NewUser {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
        })
        .await?;

    state.mailer.enqueue(EmailJob::Registered { user_id: user.id });

    Ok((
        axum::http::StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully! Please wait for admin approval.",
            "user": UserResponse::from(&user),
        })),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Invalid credentials".to_string()))?;

    let verified = bcrypt::verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("password verification failed: {e}")))?;
    if !verified {
        return Err(AppError::AuthenticationError(
            "Invalid credentials".to_string(),
        ));
    }

    if !user.is_approved() {
        let message = match user.status {
            skylane_core::user::UserStatus::Rejected => {
                "Account registration was rejected. Please contact support."
            }
            _ => "Account is pending approval",
        };
        return Err(AppError::AuthorizationError(message.to_string()));
    }

    let access = issue_token(&state.auth, &user, TOKEN_USE_ACCESS, state.auth.expiration)?;
    let refresh = issue_token(
        &state.auth,
        &user,
        TOKEN_USE_REFRESH,
        state.auth.refresh_expiration,
    )?;

    Ok(Json(LoginResponse {
        access,
        refresh,
        user: UserResponse::from(&user),
    }))
}

/// POST /api/auth/token/refresh
async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let token_data = decode::<Claims>(
        &req.refresh,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid refresh token: {e}")))?;

    let claims = token_data.claims;
    if claims.token_use != TOKEN_USE_REFRESH {
        return Err(AppError::AuthenticationError(
            "Not a refresh token".to_string(),
        ));
    }

    // Re-load the user so a rejection after issuance cuts access off.
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::AuthenticationError("Invalid refresh token".to_string()))?;
    let user = state.users.get(user_id).await?;
    if !user.is_approved() {
        return Err(AppError::AuthorizationError(
            "Account is not approved".to_string(),
        ));
    }

    let access = issue_token(&state.auth, &user, TOKEN_USE_ACCESS, state.auth.expiration)?;
    Ok(Json(json!({ "access": access })))
}

fn issue_token(
    auth: &AuthConfig,
    user: &User,
    token_use: &str,
    ttl_seconds: u64,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: if user.is_staff {
            ROLE_ADMIN.to_string()
        } else {
            ROLE_CUSTOMER.to_string()
        },
        token_use: token_use.to_string(),
        exp: (Utc::now() + Duration::seconds(ttl_seconds as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {e}")))
}
