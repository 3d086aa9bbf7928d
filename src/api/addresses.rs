//! `/addresses` resource.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::schemas::{AddressCreate, AddressList, AddressResponse, PaginationQuery};
use crate::http::response::AppError;
use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addresses", post(create_address).get(list_addresses))
        .route("/addresses/{address_id}", get(get_address))
}

#[tracing::instrument(skip_all)]
async fn create_address(
    State(state): State<AppState>,
    body: Result<Json<AddressCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<AddressResponse>), AppError> {
    let Json(address) = body?;
    tracing::debug!(actor_id = address.actor_id, city = %address.city, "Creating address");

    let actor = state.db.actors().get(address.actor_id).await?;
    let row = state.db.addresses().create(&address.into_new()).await?;

    Ok((
        StatusCode::CREATED,
        Json(AddressResponse {
            address: row.into(),
            actor: Some(actor.into()),
        }),
    ))
}

async fn list_addresses(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<Json<AddressList>, AppError> {
    let Query(query) = query?;
    let page = query.resolve(&state.config.api)?;

    let result = state.db.addresses().list(page).await?;
    let addresses = result
        .items
        .into_iter()
        .map(|row| AddressResponse {
            address: row.into(),
            actor: None,
        })
        .collect();

    Ok(Json(AddressList {
        addresses,
        total: result.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

async fn get_address(
    State(state): State<AppState>,
    address_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AddressResponse>, AppError> {
    let Path(address_id) = address_id?;
    tracing::debug!(address_id, "Getting address");

    let address = state.db.addresses().get(address_id).await?;
    let actor = state.db.actors().get(address.actor_id).await?;

    Ok(Json(AddressResponse {
        address: address.into(),
        actor: Some(actor.into()),
    }))
}
