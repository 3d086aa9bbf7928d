use sqlx::AnyPool;

use crate::db::models::{now_timestamp, ActorRow, AddressRow, MovieRow, NewActor, Page, PageRequest};
use crate::db::DatabaseError;

const ACTOR_COLUMNS: &str = "id, name, age, created_at, updated_at";

/// Queries over the `actor` table.
pub struct Actors<'a> {
    pool: &'a AnyPool,
}

impl<'a> Actors<'a> {
    pub(crate) fn new(pool: &'a AnyPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, actor), fields(name = %actor.name))]
    pub async fn create(&self, actor: &NewActor) -> Result<ActorRow, DatabaseError> {
        let row = sqlx::query_as::<_, ActorRow>(&format!(
            "INSERT INTO actor (name, age, created_at) VALUES ($1, $2, $3) RETURNING {}",
            ACTOR_COLUMNS
        ))
        .bind(&actor.name)
        .bind(actor.age)
        .bind(now_timestamp())
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(actor_id = row.id, "Actor created");
        Ok(row)
    }

    pub async fn get(&self, id: i64) -> Result<ActorRow, DatabaseError> {
        sqlx::query_as::<_, ActorRow>(&format!(
            "SELECT {} FROM actor WHERE id = $1",
            ACTOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DatabaseError::not_found("Actor"))
    }

    pub async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        super::exists(self.pool, "actor", id).await
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<ActorRow>, DatabaseError> {
        let total = super::count(self.pool, "actor").await?;
        let items = sqlx::query_as::<_, ActorRow>(&format!(
            "SELECT {} FROM actor ORDER BY id LIMIT $1 OFFSET $2",
            ACTOR_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page { items, total })
    }

    pub async fn addresses_of(&self, actor_id: i64) -> Result<Vec<AddressRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            "SELECT id, country, city, address_line_1, address_line_2, postcode, actor_id, \
             created_at, updated_at FROM address WHERE actor_id = $1 ORDER BY id",
        )
        .bind(actor_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn movies_of(&self, actor_id: i64) -> Result<Vec<MovieRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, MovieRow>(
            "SELECT m.id, m.title, m.year, m.rating, m.created_at, m.updated_at \
             FROM movie m JOIN actor_movie am ON am.movie_id = m.id \
             WHERE am.actor_id = $1 ORDER BY m.id",
        )
        .bind(actor_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;

    fn actor(name: &str, age: i64) -> NewActor {
        NewActor {
            name: name.to_string(),
            age,
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let db = memory_db().await;
        let created = db.actors().create(&actor("Brad Pitt", 60)).await.unwrap();
        assert_eq!(created.name, "Brad Pitt");
        assert!(created.updated_at.is_none());

        let fetched = db.actors().get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn missing_actor_is_not_found() {
        let db = memory_db().await;
        let err = db.actors().get(42).await.unwrap_err();
        assert_eq!(err.to_string(), "Actor not found");
        assert!(!db.actors().exists(42).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_paginated() {
        let db = memory_db().await;
        for i in 0..5 {
            db.actors().create(&actor(&format!("Actor {}", i), 30 + i)).await.unwrap();
        }

        let page = db
            .actors()
            .list(PageRequest { page: 2, page_size: 2 })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        let names: Vec<_> = page.items.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Actor 2", "Actor 3"]);
    }
}
