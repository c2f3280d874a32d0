//! User CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::EntityId;
use domain::users::UsersContext;
use domain::{CreateUser, DeleteUser, GetAllUsers, GetUser, UpdateUser, User, UserView};
use serde::Deserialize;
use store::{EntityStore, Version};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EntityStore<User>> {
    pub users: UsersContext<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Partial update. Missing or blank fields are left unchanged.
#[derive(Deserialize, Default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

// -- Handlers --

/// POST /users — register a new user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EntityStore<User>>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Response, ApiError> {
    let cmd = CreateUser::new(req.username, req.password, req.email)?;
    let user = state.users.create(cmd).await?;

    Ok(with_etag(StatusCode::CREATED, &user))
}

/// GET /users — list all users, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: EntityStore<User>>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = state.users.query_many(GetAllUsers::new()).await?;

    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// GET /users/{id} — load one user.
#[tracing::instrument(skip(state))]
pub async fn get<S: EntityStore<User>>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user_id = parse_user_id(&id)?;
    let user = state
        .users
        .query_one(GetUser::new(user_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;

    Ok(with_etag(StatusCode::OK, &user))
}

/// PUT /users/{id} — change some fields of a user.
///
/// An `If-Match` header carrying the version pins the update to it.
#[tracing::instrument(skip(state, headers, req))]
pub async fn update<S: EntityStore<User>>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Response, ApiError> {
    let user_id = parse_user_id(&id)?;

    let mut cmd = UpdateUser::new(user_id, req.username, req.password, req.email);
    if let Some(version) = if_match(&headers)? {
        cmd = cmd.with_expected_version(version);
    }

    let user = state
        .users
        .update_one(cmd)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))?;

    Ok(with_etag(StatusCode::OK, &user))
}

/// DELETE /users/{id} — remove a user. Succeeds whether or not it exists.
#[tracing::instrument(skip(state))]
pub async fn delete<S: EntityStore<User>>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_user_id(&id)?;
    state.users.delete_one(DeleteUser::new(user_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn with_etag(status: StatusCode, user: &User) -> Response {
    let mut response = (status, Json(UserView::from(user))).into_response();
    if let Ok(etag) = HeaderValue::from_str(&format!("\"{}\"", user.version)) {
        response.headers_mut().insert(header::ETAG, etag);
    }
    response
}

fn if_match(headers: &HeaderMap) -> Result<Option<Version>, ApiError> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| ApiError::BadRequest("Invalid If-Match header".to_string()))?;
    let version = raw
        .trim()
        .trim_matches('"')
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid If-Match version: {raw}")))?;

    Ok(Some(Version::new(version)))
}

fn parse_user_id(id: &str) -> Result<EntityId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(EntityId::from_uuid(uuid))
}
