//! Request and response bodies of the public API.
//!
//! Input structs ignore unknown fields; missing required fields are rejected
//! by the JSON extractor with 422.

use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::db::models::{
    ActorRow, AddressRow, MovieRow, NewActor, NewAddress, NewMovie, PageRequest, UserRow,
};
use crate::http::response::AppError;

const MAX_FIELD_LEN: usize = 255;
const MAX_RATING: i64 = 5;
const DEFAULT_YEAR: i64 = 1900;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ActorCreate {
    pub name: String,
    pub age: i64,
}

impl ActorCreate {
    pub fn into_new(self) -> NewActor {
        NewActor {
            name: self.name,
            age: self.age,
        }
    }
}

fn default_year() -> i64 {
    DEFAULT_YEAR
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieCreate {
    pub title: String,
    #[serde(default = "default_year")]
    pub year: i64,
    #[serde(default)]
    pub rating: i64,
}

impl MovieCreate {
    pub fn validate(self) -> Result<NewMovie, AppError> {
        if !(0..=MAX_RATING).contains(&self.rating) {
            return Err(AppError::Validation(format!(
                "rating must be between 0 and {MAX_RATING}"
            )));
        }
        Ok(NewMovie {
            title: self.title,
            year: self.year,
            rating: self.rating,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressCreate {
    pub country: String,
    pub city: String,
    pub address_line_1: String,
    #[serde(default)]
    pub address_line_2: Option<String>,
    #[serde(alias = "postcode")]
    pub post_code: String,
    pub actor_id: i64,
}

impl AddressCreate {
    pub fn into_new(self) -> NewAddress {
        NewAddress {
            country: self.country,
            city: self.city,
            address_line_1: self.address_line_1,
            address_line_2: self.address_line_2,
            postcode: self.post_code,
            actor_id: self.actor_id,
        }
    }
}

/// Registration body. The password is hashed before it reaches the store.
#[derive(Clone, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for UserCreate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCreate")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"**********")
            .finish()
    }
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("name", &self.name),
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            let len = value.chars().count();
            if len == 0 || len > MAX_FIELD_LEN {
                return Err(AppError::Validation(format!(
                    "{field} must be between 1 and {MAX_FIELD_LEN} characters"
                )));
            }
        }
        if !self.email.contains('@') {
            return Err(AppError::Validation("email is not a valid address".into()));
        }
        Ok(())
    }
}

/// `?page=&page_size=` of listing endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PaginationQuery {
    pub fn resolve(self, api: &ApiConfig) -> Result<PageRequest, AppError> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(i64::from(api.default_page_size));
        let max = i64::from(api.max_page_size);

        if page < 1 {
            return Err(AppError::Validation("page must be greater than or equal to 1".into()));
        }
        if !(1..=max).contains(&page_size) {
            return Err(AppError::Validation(format!(
                "page_size must be between 1 and {max}"
            )));
        }

        Ok(PageRequest {
            page: u32::try_from(page).unwrap_or(u32::MAX),
            page_size: u32::try_from(page_size).unwrap_or(api.max_page_size),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemQuery {
    pub q: Option<String>,
}

/// OAuth2 password-flow form.
#[derive(Clone, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<ActorRow> for ActorSummary {
    fn from(row: ActorRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            age: row.age,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub year: i64,
    pub rating: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<MovieRow> for MovieSummary {
    fn from(row: MovieRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            year: row.year,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSummary {
    pub id: i64,
    pub country: String,
    pub city: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub post_code: String,
    pub actor_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<AddressRow> for AddressSummary {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            country: row.country,
            city: row.city,
            address_line_1: row.address_line_1,
            address_line_2: row.address_line_2,
            post_code: row.postcode,
            actor_id: row.actor_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Actor with its addresses and movies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorResponse {
    #[serde(flatten)]
    pub actor: ActorSummary,
    pub addresses: Vec<AddressSummary>,
    pub movies: Vec<MovieSummary>,
}

impl ActorResponse {
    pub fn bare(row: ActorRow) -> Self {
        Self {
            actor: row.into(),
            addresses: Vec::new(),
            movies: Vec::new(),
        }
    }
}

/// Address with the owning actor; `actor` is null in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressResponse {
    #[serde(flatten)]
    pub address: AddressSummary,
    pub actor: Option<ActorSummary>,
}

/// Movie with its cast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieResponse {
    #[serde(flatten)]
    pub movie: MovieSummary,
    pub actors: Vec<ActorSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub disabled: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        let disabled = row.is_disabled();
        Self {
            id: row.id,
            name: row.name,
            username: row.username,
            email: row.email,
            disabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorList {
    pub actors: Vec<ActorResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressList {
    pub addresses: Vec<AddressResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieList {
    pub movies: Vec<MovieResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
