//! Database record models matching table schemas.
//!
//! Row structs derive `sqlx::FromRow` and mirror the columns of
//! [`schema`](crate::db::schema) one to one. `New*` structs carry the
//! validated input of an insert. API representations live in `api::schemas`.

use chrono::{SecondsFormat, Utc};

/// Current time as stored in timestamp columns.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ActorRow {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MovieRow {
    pub id: i64,
    pub title: String,
    pub year: i64,
    pub rating: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AddressRow {
    pub id: i64,
    pub country: String,
    pub city: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub postcode: String,
    pub actor_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub disabled: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl UserRow {
    pub fn is_disabled(&self) -> bool {
        self.disabled != 0
    }
}

#[derive(Debug, Clone)]
pub struct NewActor {
    pub name: String,
    pub age: i64,
}

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub year: i64,
    pub rating: i64,
}

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub country: String,
    pub city: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub postcode: String,
    pub actor_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub disabled: bool,
}

/// One page of a listing plus the total row count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Page request translated to `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offsets() {
        let first = PageRequest { page: 1, page_size: 10 };
        assert_eq!((first.limit(), first.offset()), (10, 0));
        let third = PageRequest { page: 3, page_size: 25 };
        assert_eq!(third.offset(), 50);
    }

    #[test]
    fn timestamps_are_rfc3339_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
