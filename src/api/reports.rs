use axum::{extract::State, Json};

use crate::report::summary::Summary;

use super::{auth::AuthedUser, error::ApiError, SharedState};

pub async fn daily(
    State(state): State<SharedState>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<Summary>, ApiError> {
    Ok(Json(state.reports.daily_summary(user.id).await?))
}

pub async fn weekly(
    State(state): State<SharedState>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<Summary>, ApiError> {
    Ok(Json(state.reports.weekly_summary(user.id).await?))
}
