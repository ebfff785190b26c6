// src/backend/auth.rs
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::backend::{error::ApiError, AppState};
use crate::database::db::queries;
use crate::database::models::User;

pub const USER_HEADER: &str = "x-user-id";

/// The caller, resolved from the `x-user-id` header set by the fronting gateway.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or(ApiError::Unauthorized)?;

        queries::get_user(&state.db, user_id)
            .await?
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}
