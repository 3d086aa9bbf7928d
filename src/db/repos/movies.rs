use sqlx::AnyPool;

use crate::db::models::{now_timestamp, ActorRow, MovieRow, NewMovie, Page, PageRequest};
use crate::db::DatabaseError;

const MOVIE_COLUMNS: &str = "id, title, year, rating, created_at, updated_at";

/// Queries over the `movie` and `actor_movie` tables.
pub struct Movies<'a> {
    pool: &'a AnyPool,
}

impl<'a> Movies<'a> {
    pub(crate) fn new(pool: &'a AnyPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, movie), fields(title = %movie.title))]
    pub async fn create(&self, movie: &NewMovie) -> Result<MovieRow, DatabaseError> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            "INSERT INTO movie (title, year, rating, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            MOVIE_COLUMNS
        ))
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.rating)
        .bind(now_timestamp())
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(movie_id = row.id, "Movie created");
        Ok(row)
    }

    pub async fn get(&self, id: i64) -> Result<MovieRow, DatabaseError> {
        sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movie WHERE id = $1",
            MOVIE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DatabaseError::not_found("Movie"))
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<MovieRow>, DatabaseError> {
        let total = super::count(self.pool, "movie").await?;
        let items = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movie ORDER BY id LIMIT $1 OFFSET $2",
            MOVIE_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page { items, total })
    }

    pub async fn actors_of(&self, movie_id: i64) -> Result<Vec<ActorRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ActorRow>(
            "SELECT a.id, a.name, a.age, a.created_at, a.updated_at \
             FROM actor a JOIN actor_movie am ON am.actor_id = a.id \
             WHERE am.movie_id = $1 ORDER BY a.id",
        )
        .bind(movie_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Link an actor to a movie. Linking twice is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn link_actor(&self, movie_id: i64, actor_id: i64) -> Result<(), DatabaseError> {
        if !super::exists(self.pool, "movie", movie_id).await? {
            return Err(DatabaseError::not_found("Movie"));
        }
        if !super::exists(self.pool, "actor", actor_id).await? {
            return Err(DatabaseError::not_found("Actor"));
        }

        sqlx::query(
            "INSERT INTO actor_movie (actor_id, movie_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(actor_id)
        .bind(movie_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewActor;
    use crate::db::test_support::memory_db;

    fn movie(title: &str) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            year: 1999,
            rating: 4,
        }
    }

    #[tokio::test]
    async fn link_is_idempotent_and_visible_from_both_sides() {
        let db = memory_db().await;
        let actor = db
            .actors()
            .create(&NewActor {
                name: "Keanu Reeves".into(),
                age: 59,
            })
            .await
            .unwrap();
        let film = db.movies().create(&movie("The Matrix")).await.unwrap();

        db.movies().link_actor(film.id, actor.id).await.unwrap();
        db.movies().link_actor(film.id, actor.id).await.unwrap();

        let cast = db.movies().actors_of(film.id).await.unwrap();
        assert_eq!(cast.len(), 1);
        assert_eq!(cast[0].name, "Keanu Reeves");

        let filmography = db.actors().movies_of(actor.id).await.unwrap();
        assert_eq!(filmography, vec![film]);
    }

    #[tokio::test]
    async fn link_requires_both_rows() {
        let db = memory_db().await;
        let film = db.movies().create(&movie("Alien")).await.unwrap();

        let err = db.movies().link_actor(film.id, 7).await.unwrap_err();
        assert_eq!(err.to_string(), "Actor not found");
        let err = db.movies().link_actor(99, 7).await.unwrap_err();
        assert_eq!(err.to_string(), "Movie not found");
    }
}
