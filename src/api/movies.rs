//! `/movies` resource.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::schemas::{MovieCreate, MovieList, MovieResponse, PaginationQuery};
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::observability::metrics;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/movies", post(create_movie).get(list_movies))
        .route("/movies/{movie_id}", get(get_movie))
        .route("/movies/{movie_id}/actors/{actor_id}", put(link_actor))
}

#[tracing::instrument(name = "movie-post-route", skip_all)]
async fn create_movie(
    State(state): State<AppState>,
    body: Result<Json<MovieCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<MovieResponse>), AppError> {
    let Json(movie) = body?;
    let movie = movie.validate()?;
    metrics::record_movie_created();

    let row = state.db.movies().create(&movie).await?;
    Ok((
        StatusCode::CREATED,
        Json(MovieResponse {
            movie: row.into(),
            actors: Vec::new(),
        }),
    ))
}

async fn list_movies(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<Json<MovieList>, AppError> {
    let Query(query) = query?;
    let page = query.resolve(&state.config.api)?;

    let result = state.db.movies().list(page).await?;
    let movies = result
        .items
        .into_iter()
        .map(|row| MovieResponse {
            movie: row.into(),
            actors: Vec::new(),
        })
        .collect();

    Ok(Json(MovieList {
        movies,
        total: result.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

async fn get_movie(
    State(state): State<AppState>,
    movie_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MovieResponse>, AppError> {
    let Path(movie_id) = movie_id?;

    let movies = state.db.movies();
    let movie = movies.get(movie_id).await?;
    let actors = movies.actors_of(movie_id).await?;

    Ok(Json(MovieResponse {
        movie: movie.into(),
        actors: actors.into_iter().map(Into::into).collect(),
    }))
}

async fn link_actor(
    State(state): State<AppState>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path((movie_id, actor_id)) = ids?;
    state.db.movies().link_actor(movie_id, actor_id).await?;
    tracing::info!(movie_id, actor_id, "Actor linked to movie");
    Ok(StatusCode::NO_CONTENT)
}
