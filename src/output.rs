//! Leaderboard export.
//!
//! Supports JSON (stdout or file) and a flattened CSV with one row per
//! contributing judge.

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::debug;

use crate::tally::Leaderboard;

/// One CSV row: a participant's standing plus one judge's vote.
#[derive(Debug, Serialize)]
struct LeaderboardRow<'a> {
    rank: usize,
    participant_id: &'a str,
    avg_score: f64,
    total_score: f64,
    vote_count: usize,
    judge_id: &'a str,
    score: f64,
    comment: &'a str,
    timestamp: &'a str,
}

/// Serializes the leaderboard as JSON into `writer`.
pub fn write_json<W: Write>(mut writer: W, leaderboard: &Leaderboard, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, leaderboard)?;
    } else {
        serde_json::to_writer(&mut writer, leaderboard)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes the leaderboard JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json_output(path: Option<&str>, leaderboard: &Leaderboard, pretty: bool) -> Result<()> {
    match path {
        Some(path) => {
            debug!(path, "Writing leaderboard JSON");
            write_json(File::create(path)?, leaderboard, pretty)
        }
        None => write_json(std::io::stdout().lock(), leaderboard, pretty),
    }
}

/// Writes the leaderboard as CSV to `path`, replacing any existing file.
///
/// Ranks start at 1 and follow leaderboard order.
pub fn write_csv(path: &str, leaderboard: &Leaderboard) -> Result<()> {
    debug!(path, participants = leaderboard.participants.len(), "Writing leaderboard CSV");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for (index, participant) in leaderboard.participants.iter().enumerate() {
        for detail in &participant.details {
            writer.serialize(LeaderboardRow {
                rank: index + 1,
                participant_id: &participant.participant_id,
                avg_score: participant.avg_score,
                total_score: participant.total_score,
                vote_count: participant.vote_count,
                judge_id: &detail.judge_id,
                score: detail.score,
                comment: &detail.comment,
                timestamp: &detail.timestamp,
            })?;
        }
    }

    writer.flush()?;
    Ok(())
}
