mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, API};

#[tokio::test]
async fn create_movie_with_defaults() {
    let app = TestApp::new().await;

    let response = app
        .post_json(&format!("{API}/movies"), json!({"title": "Metropolis"}))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["title"], "Metropolis");
    assert_eq!(response.body["year"], 1900);
    assert_eq!(response.body["rating"], 0);
    assert_eq!(response.body["actors"], json!([]));
}

#[tokio::test]
async fn rating_out_of_range_is_rejected() {
    let app = TestApp::new().await;

    for rating in [-1, 6] {
        let response = app
            .post_json(&format!("{API}/movies"), json!({"title": "Bad", "rating": rating}))
            .await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    let listed = app.get(&format!("{API}/movies")).await;
    assert_eq!(listed.body["total"], 0);
}

#[tokio::test]
async fn get_movie_with_cast() {
    let app = TestApp::new().await;
    let movie = app
        .post_json(&format!("{API}/movies"), json!({"title": "Pulp Fiction", "year": 1994, "rating": 5}))
        .await;
    let movie_id = movie.body["id"].as_i64().unwrap();
    let uma = app.create_actor("Uma Thurman", 54).await;
    let john = app.create_actor("John Travolta", 70).await;

    for actor in [uma, john, uma] {
        let linked = app.put(&format!("{API}/movies/{movie_id}/actors/{actor}")).await;
        assert_eq!(linked.status, StatusCode::NO_CONTENT);
    }

    let response = app.get(&format!("{API}/movies/{movie_id}")).await;
    assert_eq!(response.status, StatusCode::OK);
    let actors = response.body["actors"].as_array().unwrap();
    assert_eq!(actors.len(), 2);
    assert_eq!(actors[0]["name"], "Uma Thurman");
}

#[tokio::test]
async fn movie_not_found() {
    let app = TestApp::new().await;

    let response = app.get(&format!("{API}/movies/77")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["detail"], "Movie not found");
}

#[tokio::test]
async fn linking_missing_records() {
    let app = TestApp::new().await;
    let actor = app.create_actor("Someone", 30).await;

    let response = app.put(&format!("{API}/movies/5/actors/{actor}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["detail"], "Movie not found");

    let movie = app
        .post_json(&format!("{API}/movies"), json!({"title": "Solo"}))
        .await;
    let movie_id = movie.body["id"].as_i64().unwrap();
    let response = app.put(&format!("{API}/movies/{movie_id}/actors/999")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["detail"], "Actor not found");
}

#[tokio::test]
async fn list_movies_paginates() {
    let app = TestApp::new().await;
    for i in 0..3 {
        app.post_json(&format!("{API}/movies"), json!({"title": format!("Movie {i}")}))
            .await;
    }

    let response = app.get(&format!("{API}/movies?page=2&page_size=2")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 3);
    assert_eq!(response.body["page"], 2);
    assert_eq!(response.body["movies"][0]["title"], "Movie 2");
}
