use crate::tally::score::{coerce_score, round_to};
use crate::tally::types::{JudgeDetail, Leaderboard, ParticipantAggregate, ScoreEntry, VoteRecord};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Decimal places kept on `avg_score`.
const AVG_SCORE_PLACES: i32 = 3;

/// The winning entry for one (judge, participant) pair.
struct LatestVote<'a> {
    judge_id: &'a str,
    participant_id: &'a str,
    timestamp: &'a str,
    entry: &'a ScoreEntry,
}

/// Aggregates `records` into a [`Leaderboard`] stamped with the current time.
pub fn aggregate(records: &[VoteRecord]) -> Leaderboard {
    aggregate_at(records, Utc::now())
}

/// Aggregates `records` into a [`Leaderboard`] stamped with `now`.
///
/// Only the latest vote per (judge, participant) counts, compared by raw
/// timestamp string. Among equal timestamps the record later in `records`
/// wins. Records without a judge, entries without a participant, and
/// entries whose score is not numeric are skipped. Never fails.
pub fn aggregate_at(records: &[VoteRecord], now: DateTime<Utc>) -> Leaderboard {
    let latest = latest_votes(records);
    let pair_count = latest.len();

    let mut by_participant: HashMap<&str, ParticipantAggregate> = HashMap::new();
    let mut dropped = 0usize;

    for vote in latest {
        let Some(score) = vote.entry.score.as_ref().and_then(coerce_score) else {
            dropped += 1;
            continue;
        };

        let row = by_participant
            .entry(vote.participant_id)
            .or_insert_with(|| ParticipantAggregate::new(vote.participant_id));

        row.total_score += score;
        row.vote_count += 1;
        row.details.push(JudgeDetail {
            judge_id: vote.judge_id.to_string(),
            score,
            comment: vote.entry.comment.clone().unwrap_or_default(),
            timestamp: vote.timestamp.to_string(),
        });
    }

    let mut participants: Vec<ParticipantAggregate> = by_participant
        .into_values()
        .map(|mut row| {
            row.avg_score = if row.vote_count == 0 {
                0.0
            } else {
                round_to(row.total_score / row.vote_count as f64, AVG_SCORE_PLACES)
            };
            row
        })
        .collect();

    participants.sort_by(leaderboard_order);

    debug!(
        records = records.len(),
        pairs = pair_count,
        dropped,
        participants = participants.len(),
        "Leaderboard aggregated"
    );

    Leaderboard {
        ok: true,
        last_updated: now,
        participants,
    }
}

/// Keeps the latest entry per (judge, participant), in first-seen order.
fn latest_votes(records: &[VoteRecord]) -> Vec<LatestVote<'_>> {
    let mut slots: HashMap<(&str, &str), usize> = HashMap::new();
    let mut votes: Vec<LatestVote<'_>> = Vec::new();

    for record in records {
        let Some(judge_id) = record.judge_id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        let timestamp = record.timestamp.as_deref().unwrap_or("");

        for entry in &record.results {
            let Some(participant_id) = entry.participant_id.as_deref().filter(|id| !id.is_empty())
            else {
                continue;
            };

            match slots.get(&(judge_id, participant_id)) {
                Some(&slot) => {
                    let current = &mut votes[slot];
                    if timestamp >= current.timestamp {
                        current.timestamp = timestamp;
                        current.entry = entry;
                    }
                }
                None => {
                    slots.insert((judge_id, participant_id), votes.len());
                    votes.push(LatestVote {
                        judge_id,
                        participant_id,
                        timestamp,
                        entry,
                    });
                }
            }
        }
    }

    votes
}

/// Average descending, then vote count descending, then participant id ascending.
fn leaderboard_order(a: &ParticipantAggregate, b: &ParticipantAggregate) -> Ordering {
    b.avg_score
        .total_cmp(&a.avg_score)
        .then_with(|| b.vote_count.cmp(&a.vote_count))
        .then_with(|| a.participant_id.cmp(&b.participant_id))
}
