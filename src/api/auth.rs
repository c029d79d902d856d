use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::storage::{entities::UserRecord, user_store::RegisterError};

use super::{error::ApiError, SharedState};

/// The account resolved from the request's `Authorization: Bearer <api-key>` header.
pub struct AuthedUser(pub UserRecord);

impl FromRequestParts<SharedState> for AuthedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let user = state
            .user_store
            .find_by_api_key(key)
            .await
            .ok_or(ApiError::Unauthorized)?;
        Ok(AuthedUser(user))
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
}

pub async fn register(
    State(state): State<SharedState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    if !body.email.contains('@') {
        return Err(ApiError::Validation("email is not valid".into()));
    }

    let user = state
        .user_store
        .register(body.name, body.email)
        .await
        .map_err(|e| match e {
            RegisterError::DuplicateEmail(_) => ApiError::Conflict(e.to_string()),
            RegisterError::Storage(e) => ApiError::Internal(e),
        })?;

    Ok(Json(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "apiKey": user.api_key,
    })))
}

pub async fn regenerate_api_key(
    State(state): State<SharedState>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<Value>, ApiError> {
    let key = state
        .user_store
        .regenerate_api_key(user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(json!({ "apiKey": key })))
}
