//! Data types used by the tally pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single judge submission as stored in the record namespace.
///
/// Deserialization is lenient: fields of the wrong JSON type are treated as
/// absent so that one odd field never costs the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub judge_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub results: Vec<ScoreEntry>,
}

/// One judge's opinion of one participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub participant_id: Option<String>,
    /// Kept raw; numeric strings are accepted at aggregation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment: Option<String>,
}

/// A contributing judge's vote inside a [`ParticipantAggregate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeDetail {
    pub judge_id: String,
    pub score: f64,
    pub comment: String,
    pub timestamp: String,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAggregate {
    pub participant_id: String,
    pub total_score: f64,
    pub vote_count: usize,
    pub avg_score: f64,
    pub details: Vec<JudgeDetail>,
}

impl ParticipantAggregate {
    pub(crate) fn new(participant_id: &str) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            total_score: 0.0,
            vote_count: 0,
            avg_score: 0.0,
            details: Vec::new(),
        }
    }
}

/// Aggregation result, served as the `/results` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub ok: bool,
    pub last_updated: DateTime<Utc>,
    pub participants: Vec<ParticipantAggregate>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Accepts `null` as an empty list and drops entries that are not objects.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<ScoreEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_parses_camel_case_fields() {
        let record: VoteRecord = serde_json::from_value(json!({
            "judgeId": "J1",
            "timestamp": "2025-01-01T00:00:00Z",
            "results": [{"participantId": "P1", "score": 8, "comment": "solid"}]
        }))
        .unwrap();

        assert_eq!(record.judge_id.as_deref(), Some("J1"));
        assert_eq!(record.timestamp.as_deref(), Some("2025-01-01T00:00:00Z"));
        assert_eq!(record.results.len(), 1);
        assert_eq!(record.results[0].participant_id.as_deref(), Some("P1"));
        assert_eq!(record.results[0].score, Some(json!(8)));
        assert_eq!(record.results[0].comment.as_deref(), Some("solid"));
    }

    #[test]
    fn test_wrong_field_types_are_treated_as_absent() {
        let record: VoteRecord = serde_json::from_value(json!({
            "judgeId": 42,
            "timestamp": false,
            "results": [{"participantId": ["P1"], "comment": 3}]
        }))
        .unwrap();

        assert_eq!(record.judge_id, None);
        assert_eq!(record.timestamp, None);
        assert_eq!(record.results[0].participant_id, None);
        assert_eq!(record.results[0].comment, None);
    }

    #[test]
    fn test_non_object_entries_are_dropped() {
        let record: VoteRecord = serde_json::from_value(json!({
            "judgeId": "J1",
            "results": [7, {"participantId": "P1", "score": 1}, "junk"]
        }))
        .unwrap();

        assert_eq!(record.results.len(), 1);
    }

    #[test]
    fn test_missing_or_null_results_is_empty() {
        let missing: VoteRecord = serde_json::from_value(json!({"judgeId": "J1"})).unwrap();
        let null: VoteRecord =
            serde_json::from_value(json!({"judgeId": "J1", "results": null})).unwrap();

        assert!(missing.results.is_empty());
        assert!(null.results.is_empty());
    }

    #[test]
    fn test_results_of_wrong_type_is_an_error() {
        let result = serde_json::from_value::<VoteRecord>(json!({
            "judgeId": "J1",
            "results": {"participantId": "P1"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_leaderboard_serializes_camel_case() {
        let board = Leaderboard {
            ok: true,
            last_updated: "2025-01-03T00:00:00Z".parse().unwrap(),
            participants: vec![ParticipantAggregate {
                participant_id: "P1".into(),
                total_score: 8.0,
                vote_count: 1,
                avg_score: 8.0,
                details: vec![JudgeDetail {
                    judge_id: "J1".into(),
                    score: 8.0,
                    comment: String::new(),
                    timestamp: "2025-01-01T00:00:00Z".into(),
                }],
            }],
        };

        let value = serde_json::to_value(&board).unwrap();
        assert_eq!(value["ok"], json!(true));
        assert_eq!(value["lastUpdated"], json!("2025-01-03T00:00:00Z"));
        assert_eq!(value["participants"][0]["participantId"], json!("P1"));
        assert_eq!(value["participants"][0]["totalScore"], json!(8.0));
        assert_eq!(value["participants"][0]["voteCount"], json!(1));
        assert_eq!(value["participants"][0]["avgScore"], json!(8.0));
        assert_eq!(value["participants"][0]["details"][0]["judgeId"], json!("J1"));
    }
}
