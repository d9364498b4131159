use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::AppState;
use crate::store::naming::record_key;
use crate::store::{StoreError, WriteMode, load_records};
use crate::tally::aggregate;
use crate::tally::validate::parse_submission;

fn failure(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": code }))).into_response()
}

/// `POST /submit_vote`
pub async fn submit_vote(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let submission = match parse_submission(&body, Utc::now()) {
        Ok(submission) => submission,
        Err(e) => {
            warn!(error = %e, "Rejected vote submission");
            return failure(StatusCode::BAD_REQUEST, e.code());
        }
    };

    let key = record_key(
        &state.config.prefix,
        &submission.judge_id,
        &submission.timestamp,
    );

    let contents = match serde_json::to_vec_pretty(&submission.payload) {
        Ok(contents) => contents,
        Err(e) => {
            error!(error = %e, "Failed to encode submission");
            return failure(StatusCode::INTERNAL_SERVER_ERROR, "upload_failed");
        }
    };

    match state
        .store
        .put(&key, Bytes::from(contents), WriteMode::Create)
        .await
    {
        Ok(()) => {
            info!(judge_id = %submission.judge_id, key = %key, "Vote submission stored");
            (StatusCode::OK, Json(json!({ "ok": true, "path": key }))).into_response()
        }
        Err(StoreError::AlreadyExists { .. }) => {
            warn!(judge_id = %submission.judge_id, key = %key, "Duplicate vote submission");
            failure(StatusCode::CONFLICT, "already_submitted")
        }
        Err(e) => {
            error!(judge_id = %submission.judge_id, key = %key, error = %e, "Vote upload failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "upload_failed")
        }
    }
}

/// `GET /results`
pub async fn results(State(state): State<Arc<AppState>>) -> Response {
    match load_records(state.store.as_ref(), &state.config.prefix).await {
        Ok(records) => {
            let leaderboard = aggregate(&records);
            info!(
                records = records.len(),
                participants = leaderboard.participants.len(),
                "Leaderboard served"
            );
            (StatusCode::OK, Json(leaderboard)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to load vote records");
            failure(StatusCode::BAD_GATEWAY, "aggregate_failed")
        }
    }
}

/// `GET /health`
pub async fn health() -> Response {
    Json(json!({ "ok": true })).into_response()
}
