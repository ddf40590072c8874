//! User handlers
//!
//! CRUD endpoints mounted under `/api/users`.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, MethodRouter},
    Json, Router,
};
use serde::Serialize;

use crate::domain::entities::{NewUser, User, UserFilter, UserId, UserUpdate};
use crate::error::AppError;
use crate::middleware::JsonBody;
use crate::AppState;

/// Routes relative to the `/api/users` mount point
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", collection())
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// List and create, shared by `/api/users` and `/api/users/`
pub fn collection() -> MethodRouter<AppState> {
    get(list_users).post(create_user)
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/users
///
/// Query parameters become an equality filter.
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let filter = UserFilter::from(params);
    let users = state.users.list(&filter).await?;

    tracing::debug!(count = users.len(), "Listed users");
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.users.create(&request).await?;

    tracing::info!(user_id = %user.id, "Created user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id: UserId = id.parse()?;
    let user = state
        .users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

    Ok(Json(user.into()))
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UserUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    let id: UserId = id.parse()?;
    let user = state
        .users
        .update(&id, &request)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

    tracing::info!(user_id = %id, "Updated user");
    Ok(Json(user.into()))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: UserId = id.parse()?;
    if !state.users.delete(&id).await? {
        return Err(AppError::NotFound(format!("User {}", id)));
    }

    tracing::info!(user_id = %id, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}
