//! `/users` resource: registration and listing.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::api::schemas::{PaginationQuery, UserCreate, UserList, UserResponse};
use crate::db::models::NewUser;
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::security::auth::ActiveUser;
use crate::security::password::hash_password;

pub fn router() -> Router<AppState> {
    Router::new().route("/users", post(register_user).get(list_users))
}

#[tracing::instrument(skip_all)]
async fn register_user(
    State(state): State<AppState>,
    body: Result<Json<UserCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(user) = body?;
    user.validate()?;

    let UserCreate {
        name,
        username,
        email,
        password,
    } = user;

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let row = state
        .db
        .users()
        .create(&NewUser {
            name,
            username,
            email,
            password_hash,
            disabled: false,
        })
        .await?;

    tracing::info!(username = %row.username, "User registered");
    Ok((StatusCode::CREATED, Json(row.into())))
}

async fn list_users(
    State(state): State<AppState>,
    ActiveUser(_user): ActiveUser,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<Json<UserList>, AppError> {
    let Query(query) = query?;
    let page = query.resolve(&state.config.api)?;

    let result = state.db.users().list(page).await?;
    Ok(Json(UserList {
        users: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page: page.page,
        page_size: page.page_size,
    }))
}
