//! Bearer-token authentication for handlers.
//!
//! `CurrentUser` resolves the token owner; `ActiveUser` additionally rejects
//! disabled accounts. Both are axum extractors over [`AppState`].

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::db::models::UserRow;
use crate::db::Database;
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::password::verify_password;

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Check a username/password pair against the store.
pub async fn authenticate(db: &Database, username: &str, password: &str) -> Result<UserRow, AppError> {
    let user = match db.users().get_by_username(username).await {
        Ok(user) => user,
        Err(e) => {
            metrics::record_auth_failure("unknown_user");
            return Err(e.into());
        }
    };

    let hash = user.password.clone();
    let password = password.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::info!(username = %username, "Password mismatch");
        metrics::record_auth_failure("bad_password");
        return Err(AppError::BadRequest("User or password incorrect".into()));
    }
    Ok(user)
}

/// The user owning the request's access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

        let username = state.tokens.subject_of(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            metrics::record_auth_failure("invalid_token");
            AppError::Unauthorized("Could not validate credentials".into())
        })?;

        let user = state.db.users().get_by_username(&username).await?;
        Ok(CurrentUser(user))
    }
}

/// A [`CurrentUser`] whose account is not disabled.
#[derive(Debug, Clone)]
pub struct ActiveUser(pub UserRow);

impl FromRequestParts<AppState> for ActiveUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_disabled() {
            return Err(AppError::BadRequest("Inactive user".into()));
        }
        Ok(ActiveUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn parses_bearer_scheme() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
