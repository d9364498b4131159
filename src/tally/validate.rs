//! Submission-side checks applied before a payload reaches the record store.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Why a submitted payload was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload has no non-empty judgeId")]
    MissingJudge,

    #[error("payload results is not an array")]
    ResultsNotArray,
}

impl SubmissionError {
    /// Short machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SubmissionError::InvalidJson(_) => "invalid_json",
            SubmissionError::MissingJudge | SubmissionError::ResultsNotArray => "bad_payload",
        }
    }
}

/// A payload that passed validation, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub judge_id: String,
    pub timestamp: String,
    /// The payload as submitted, with `timestamp` filled in when it was missing.
    pub payload: Value,
}

/// Parses raw request bytes and validates them with [`validate_submission`].
pub fn parse_submission(body: &[u8], now: DateTime<Utc>) -> Result<Submission, SubmissionError> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| SubmissionError::InvalidJson(e.to_string()))?;
    validate_submission(payload, now)
}

/// Checks that `payload` has a non-empty string `judgeId` and an array
/// `results`. A missing or non-string `timestamp` is replaced by `now`.
pub fn validate_submission(
    mut payload: Value,
    now: DateTime<Utc>,
) -> Result<Submission, SubmissionError> {
    let Some(object) = payload.as_object_mut() else {
        return Err(SubmissionError::MissingJudge);
    };

    let judge_id = object
        .get("judgeId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(SubmissionError::MissingJudge)?
        .to_string();

    if !object.get("results").is_some_and(Value::is_array) {
        return Err(SubmissionError::ResultsNotArray);
    }

    let timestamp = match object.get("timestamp") {
        Some(Value::String(ts)) => ts.clone(),
        _ => {
            let ts = now.to_rfc3339_opts(SecondsFormat::Millis, true);
            object.insert("timestamp".to_string(), Value::String(ts.clone()));
            ts
        }
    };

    Ok(Submission {
        judge_id,
        timestamp,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2025-11-17T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_valid_payload_is_accepted() {
        let payload = json!({
            "judgeId": "J1",
            "timestamp": "2025-11-17T08:00:00Z",
            "results": [{"participantId": "P1", "score": 8}],
            "round": "final"
        });

        let submission = validate_submission(payload.clone(), now()).unwrap();

        assert_eq!(submission.judge_id, "J1");
        assert_eq!(submission.timestamp, "2025-11-17T08:00:00Z");
        assert_eq!(submission.payload, payload);
    }

    #[test]
    fn test_missing_timestamp_is_filled_in() {
        let submission =
            validate_submission(json!({"judgeId": "J1", "results": []}), now()).unwrap();

        assert_eq!(submission.timestamp, "2025-11-17T09:00:00.000Z");
        assert_eq!(
            submission.payload["timestamp"],
            json!("2025-11-17T09:00:00.000Z")
        );
    }

    #[test]
    fn test_missing_or_empty_judge_is_rejected() {
        assert_eq!(
            validate_submission(json!({"results": []}), now()),
            Err(SubmissionError::MissingJudge)
        );
        assert_eq!(
            validate_submission(json!({"judgeId": "", "results": []}), now()),
            Err(SubmissionError::MissingJudge)
        );
        assert_eq!(
            validate_submission(json!({"judgeId": 7, "results": []}), now()),
            Err(SubmissionError::MissingJudge)
        );
    }

    #[test]
    fn test_results_must_be_an_array() {
        assert_eq!(
            validate_submission(json!({"judgeId": "J1"}), now()),
            Err(SubmissionError::ResultsNotArray)
        );
        assert_eq!(
            validate_submission(json!({"judgeId": "J1", "results": {"P1": 3}}), now()),
            Err(SubmissionError::ResultsNotArray)
        );
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let err = validate_submission(json!([1, 2, 3]), now()).unwrap_err();
        assert_eq!(err.code(), "bad_payload");
    }

    #[test]
    fn test_invalid_json_has_its_own_code() {
        let err = parse_submission(b"{not json", now()).unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidJson(_)));
        assert_eq!(err.code(), "invalid_json");
    }
}
