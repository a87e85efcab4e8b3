use axum::extract::State;
use axum::Extension;
use serde::Serialize;

use crate::auth::{generate_token, Claims};
use crate::config::config;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json};
use crate::models::user::{User, UserCreate, UserStore};
use crate::validation::auth::{validate_login, validate_register, LoginBody, RegisterBody};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<AuthPayload> {
    let data = validate_register(body)?;

    let store = UserStore::new(&state.db);
    if store
        .find_by_email_or_username(&data.email, &data.username)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request(
            "User already exists with this email or username",
        ));
    }

    let password_hash = hash_password(data.password).await?;
    let user = store
        .create(UserCreate {
            username: data.username,
            email: data.email,
            password_hash,
            role: data.role,
        })
        .await?;

    let token = issue_token(&user)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::created(AuthPayload { token, user }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<AuthPayload> {
    let data = validate_login(body)?;

    let store = UserStore::new(&state.db);
    let credentials = store
        .find_by_email(&data.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let password = data.password;
    let hash = credentials.password.clone();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| ApiError::internal_detail("Password verification failed", err))?
        .map_err(|err| ApiError::internal_detail("Password verification failed", err))?;

    if !matches {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let user = credentials.into_user();
    let token = issue_token(&user)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(AuthPayload { token, user }))
}

pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> ApiResult<User> {
    Ok(ApiResponse::success(user))
}

async fn hash_password(password: String) -> Result<String, ApiError> {
    let cost = config().security.bcrypt_cost;
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| ApiError::internal_detail("Password hashing failed", err))?
        .map_err(|err| ApiError::internal_detail("Password hashing failed", err))
}

fn issue_token(user: &User) -> Result<String, ApiError> {
    let security = &config().security;
    let claims = Claims::new(user.id, user.role, security.jwt_expiry_hours);
    generate_token(&claims, &security.jwt_secret)
        .map_err(|err| ApiError::internal_detail("Failed to issue token", err))
}
