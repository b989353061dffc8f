use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest},
        jwt::{AuthUser, JwtKeys},
        password::spawn_hash,
    },
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::{PublicUser, SignUpRequest, SignUpResponse, UpdateUserRequest},
        extractors::{JsonBody, UserId},
        repo_types::{NewUser, User, UserChanges},
        services::{normalize_email, validate_account_fields},
    },
};

const BAD_CREDENTIALS: &str = "user not found or bad password";

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            post(sign_up).get(get_all).put(missing_id).delete(missing_id),
        )
        .route(
            "/users/",
            get(missing_id).put(missing_id).delete(missing_id),
        )
        .route(
            "/users/:id",
            get(get_by_id).put(update_by_id).delete(delete_by_id),
        )
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/users/login", post(log_in))
        .route("/users/refresh", post(refresh))
        .route("/users/me", get(get_me))
}

/// Item routes hit without an `:id` segment.
async fn missing_id() -> AppError {
    AppError::BadRequest("Missing user id".into())
}

fn not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

fn issue_tokens(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SignUpRequest>,
) -> AppResult<Json<SignUpResponse>> {
    let email = normalize_email(&payload.email);
    validate_account_fields(&email, &payload.password, &payload.username)?;

    let password_hash = spawn_hash(&payload.password).await?;
    let user = state
        .users
        .insert(NewUser {
            id: Uuid::new_v4(),
            username: payload.username.trim().to_string(),
            email,
            password_hash,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "sign up rejected");
            e
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(SignUpResponse {
        email: user.email,
        success: 1,
    }))
}

#[instrument(skip(state, payload))]
pub async fn log_in(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);
    let Some(user) = state.users.compare_password(&email, &payload.password).await? else {
        warn!(email = %email, "login failed");
        return Err(AppError::BadRequest(BAD_CREDENTIALS.into()));
    };

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("Invalid refresh token".into())
    })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_all(State(state): State<AppState>) -> AppResult<Json<Vec<PublicUser>>> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_by_id(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> AppResult<Json<PublicUser>> {
    let user = state.users.find_by_id(id).await?.ok_or_else(not_found)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_by_id(
    State(state): State<AppState>,
    UserId(id): UserId,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> AppResult<Json<PublicUser>> {
    let email = normalize_email(&payload.email);
    validate_account_fields(&email, &payload.password, &payload.username)?;

    let changes = UserChanges {
        username: payload.username.trim().to_string(),
        email,
        password_hash: spawn_hash(&payload.password).await?,
    };
    let user = state
        .users
        .update_by_id(id, changes)
        .await?
        .ok_or_else(not_found)?;

    info!(user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_by_id(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> AppResult<StatusCode> {
    if !state.users.delete_by_id(id).await? {
        return Err(not_found());
    }
    info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
