use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use viaro_core::identity;
use viaro_core::repository::{UserRecord, UserRole};
use viaro_shared::Masked;

use crate::{error::AppError, middleware::auth::Claims, state::AppState};

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    full_name: String,
    email: String,
    phone: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    role: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/guest", post(login_guest))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    let user = UserRecord {
        id: Uuid::new_v4(),
        full_name: req.full_name,
        email: req.email,
        phone: Masked(req.phone),
        password_hash: identity::hash_password(&req.password)?,
        role: UserRole::Customer,
        created_at: Utc::now(),
    };
    state.users.create_user(&user).await?;

    tracing::info!(user_id = %user.id, "Registered user");
    issue_token(&state, &user)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Invalid credentials".to_string()))?;

    if !identity::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::AuthenticationError(
            "Invalid credentials".to_string(),
        ));
    }

    issue_token(&state, &user)
}

/// Anonymous browse session. Guests can search and watch seat streams but
/// cannot hold seats; booking routes require a registered subject.
async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let claims = Claims {
        sub: format!("guest-{}", Uuid::new_v4()),
        email: None,
        role: "GUEST".to_string(),
        exp: expiry(&state),
    };
    sign(&state, claims, "GUEST")
}

fn issue_token(state: &AppState, user: &UserRecord) -> Result<Json<AuthResponse>, AppError> {
    let role = user.role.as_str();
    let claims = Claims {
        sub: user.id.to_string(),
        email: Some(user.email.clone()),
        role: role.to_string(),
        exp: expiry(state),
    };
    sign(state, claims, role)
}

fn expiry(state: &AppState) -> usize {
    (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize
}

fn sign(state: &AppState, claims: Claims, role: &str) -> Result<Json<AuthResponse>, AppError> {
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(AuthResponse {
        token,
        role: role.to_string(),
    }))
}
