use sqlx::AnyPool;

use crate::db::models::{now_timestamp, NewUser, Page, PageRequest, UserRow};
use crate::db::DatabaseError;

const USER_COLUMNS: &str =
    "id, name, username, email, password, disabled, created_at, updated_at";

/// Queries over the `app_user` table.
pub struct Users<'a> {
    pool: &'a AnyPool,
}

impl<'a> Users<'a> {
    pub(crate) fn new(pool: &'a AnyPool) -> Self {
        Self { pool }
    }

    /// Insert a user; a taken username is a conflict.
    #[tracing::instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create(&self, user: &NewUser) -> Result<UserRow, DatabaseError> {
        if self.find_by_username(&user.username).await?.is_some() {
            return Err(username_taken(&user.username));
        }

        let result = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO app_user (name, username, email, password, disabled, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(i64::from(user.disabled))
        .bind(now_timestamp())
        .fetch_one(self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(username_taken(&user.username))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM app_user WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<UserRow, DatabaseError> {
        self.find_by_username(username)
            .await?
            .ok_or(DatabaseError::not_found("User"))
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<UserRow>, DatabaseError> {
        let total = super::count(self.pool, "app_user").await?;
        let items = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM app_user ORDER BY id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page { items, total })
    }
}

fn username_taken(username: &str) -> DatabaseError {
    DatabaseError::Conflict(format!("Username '{}' already registered", username))
}
