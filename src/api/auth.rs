//! `/auth` routes: OAuth2 password flow and identity check.

use axum::{
    extract::{rejection::FormRejection, State},
    routing::{get, post},
    Form, Json, Router,
};

use crate::api::schemas::{MessageResponse, TokenForm, TokenResponse};
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::auth::{authenticate, ActiveUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(login_for_access_token))
        .route("/auth/me", get(me))
}

#[tracing::instrument(skip_all)]
async fn login_for_access_token(
    State(state): State<AppState>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Form(form) = form?;
    let user = authenticate(&state.db, &form.username, &form.password).await?;

    let token = state
        .tokens
        .create_access_token(&user.username, None)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    metrics::record_token_issued();
    tracing::info!(username = %user.username, "Access token issued");
    Ok(Json(TokenResponse::bearer(token)))
}

async fn me(ActiveUser(user): ActiveUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("User {} authenticated", user.username),
    })
}
