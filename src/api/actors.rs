//! `/actors` resource.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::schemas::{ActorCreate, ActorList, ActorResponse, PaginationQuery};
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::observability::metrics;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actors", post(create_actor).get(list_actors))
        .route("/actors/{actor_id}", get(get_actor))
}

#[tracing::instrument(name = "actor-post-route", skip_all)]
async fn create_actor(
    State(state): State<AppState>,
    body: Result<Json<ActorCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ActorResponse>), AppError> {
    let Json(actor) = body?;
    metrics::record_actor_created();
    tracing::debug!(name = %actor.name, age = actor.age, "Creating actor");

    let row = state.db.actors().create(&actor.into_new()).await?;
    Ok((StatusCode::CREATED, Json(ActorResponse::bare(row))))
}

async fn list_actors(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<Json<ActorList>, AppError> {
    let Query(query) = query?;
    let page = query.resolve(&state.config.api)?;

    let result = state.db.actors().list(page).await?;
    Ok(Json(ActorList {
        actors: result.items.into_iter().map(ActorResponse::bare).collect(),
        total: result.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

async fn get_actor(
    State(state): State<AppState>,
    actor_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ActorResponse>, AppError> {
    let Path(actor_id) = actor_id?;
    tracing::debug!(actor_id, "Getting actor");

    let actors = state.db.actors();
    let actor = actors.get(actor_id).await?;
    let addresses = actors.addresses_of(actor_id).await?;
    let movies = actors.movies_of(actor_id).await?;

    Ok(Json(ActorResponse {
        actor: actor.into(),
        addresses: addresses.into_iter().map(Into::into).collect(),
        movies: movies.into_iter().map(Into::into).collect(),
    }))
}
