use sqlx::AnyPool;

use crate::db::models::{now_timestamp, AddressRow, NewAddress, Page, PageRequest};
use crate::db::DatabaseError;

const ADDRESS_COLUMNS: &str =
    "id, country, city, address_line_1, address_line_2, postcode, actor_id, created_at, updated_at";

/// Queries over the `address` table.
pub struct Addresses<'a> {
    pool: &'a AnyPool,
}

impl<'a> Addresses<'a> {
    pub(crate) fn new(pool: &'a AnyPool) -> Self {
        Self { pool }
    }

    /// Insert an address for an existing actor.
    #[tracing::instrument(skip(self, address), fields(actor_id = address.actor_id))]
    pub async fn create(&self, address: &NewAddress) -> Result<AddressRow, DatabaseError> {
        if !super::exists(self.pool, "actor", address.actor_id).await? {
            return Err(DatabaseError::not_found("Actor"));
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO address (country, city, address_line_1, address_line_2, postcode, \
             actor_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            ADDRESS_COLUMNS
        ))
        .bind(&address.country)
        .bind(&address.city)
        .bind(&address.address_line_1)
        .bind(address.address_line_2.clone())
        .bind(&address.postcode)
        .bind(address.actor_id)
        .bind(now_timestamp())
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get(&self, id: i64) -> Result<AddressRow, DatabaseError> {
        sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {} FROM address WHERE id = $1",
            ADDRESS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DatabaseError::not_found("Address"))
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<AddressRow>, DatabaseError> {
        let total = super::count(self.pool, "address").await?;
        let items = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {} FROM address ORDER BY id LIMIT $1 OFFSET $2",
            ADDRESS_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewActor;
    use crate::db::test_support::memory_db;

    fn address(actor_id: i64) -> NewAddress {
        NewAddress {
            country: "Portugal".into(),
            city: "Lisbon".into(),
            address_line_1: "Rua Augusta 1".into(),
            address_line_2: None,
            postcode: "1100-048".into(),
            actor_id,
        }
    }

    #[tokio::test]
    async fn create_requires_actor() {
        let db = memory_db().await;
        let err = db.addresses().create(&address(1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Actor not found");
    }

    #[tokio::test]
    async fn create_keeps_optional_line() {
        let db = memory_db().await;
        let actor = db
            .actors()
            .create(&NewActor {
                name: "Maria de Medeiros".into(),
                age: 58,
            })
            .await
            .unwrap();

        let row = db.addresses().create(&address(actor.id)).await.unwrap();
        assert_eq!(row.address_line_2, None);
        assert_eq!(row.actor_id, actor.id);
        assert_eq!(db.addresses().get(row.id).await.unwrap(), row);
        assert_eq!(db.actors().addresses_of(actor.id).await.unwrap(), vec![row]);
    }
}
