use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::storage::{
    activity_store::ActivityStore,
    entities::{computed_duration, ActivityRecord},
};

use super::{auth::AuthedUser, error::ApiError, SharedState};

/// Ingestion payload for one activity event. Times are epoch milliseconds; the server
/// computes the duration itself.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub project: String,
    pub file: String,
    pub language: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub machine: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Editor plugins send either a single event or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ActivityBody {
    Many(Vec<ActivityPayload>),
    One(Box<ActivityPayload>),
}

fn validate(payload: &ActivityPayload) -> Result<(), ApiError> {
    if payload.project.chars().count() < 2 {
        return Err(ApiError::Validation(
            "project must be at least 2 characters".into(),
        ));
    }
    if payload.file.chars().count() < 3 {
        return Err(ApiError::Validation(
            "file must be at least 3 characters".into(),
        ));
    }
    if payload.language.is_empty() {
        return Err(ApiError::Validation("language must not be empty".into()));
    }
    Ok(())
}

pub async fn create(
    State(state): State<SharedState>,
    AuthedUser(user): AuthedUser,
    Json(body): Json<ActivityBody>,
) -> Result<Json<Value>, ApiError> {
    let payloads = match body {
        ActivityBody::Many(payloads) => payloads,
        ActivityBody::One(payload) => vec![*payload],
    };
    for payload in &payloads {
        validate(payload)?;
    }

    let now = state.clock.time();
    let records = payloads
        .into_iter()
        .map(|payload| ActivityRecord {
            id: Uuid::new_v4(),
            duration: computed_duration(payload.start_time, payload.end_time),
            project: payload.project,
            file: payload.file,
            language: payload.language,
            start_time: payload.start_time,
            end_time: payload.end_time,
            branch: payload.branch,
            debug: payload.debug,
            machine: payload.machine,
            platform: payload.platform,
            created_at: now,
        })
        .collect::<Vec<_>>();

    let count = records.len();
    state.activity_store.append(user.id, records).await?;
    info!("Recorded {count} activities for {}", user.id);

    Ok(Json(json!({
        "success": true,
        "message": format!("{count} activities recorded"),
    })))
}

pub async fn list(
    State(state): State<SharedState>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<Vec<ActivityRecord>>, ApiError> {
    let records = state.activity_store.all_for_user(user.id).await?;
    Ok(Json(records))
}
