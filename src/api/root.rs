//! Routes mounted at the server root, outside the API prefix.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::schemas::{ItemQuery, MessageResponse};
use crate::http::response::AppError;
use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthchecker", get(healthchecker))
        .route("/items/{item_id}", get(read_item))
        .route("/metrics", get(render_metrics))
}

async fn healthchecker() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "The API is LIVE!!".to_string(),
    })
}

async fn read_item(
    item_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(item_id) = item_id?;
    let Query(query) = query?;
    Ok(Json(json!({ "item_id": item_id, "q": query.q })))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics disabled").into_response(),
    }
}
