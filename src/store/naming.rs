//! Object key layout for stored submissions.
//!
//! Every submission gets its own object, `{prefix}/{judge}_{timestamp}.json`,
//! so resubmissions never overwrite history.

/// File extension of vote record objects.
pub const RECORD_EXTENSION: &str = ".json";

/// Builds the object key for a submission.
///
/// `:` in the timestamp becomes `-`, and any character outside
/// `[A-Za-z0-9._-]` in either part becomes `_`.
pub fn record_key(prefix: &str, judge_id: &str, timestamp: &str) -> String {
    let file_name = format!(
        "{}_{}{}",
        sanitize(judge_id),
        sanitize(&timestamp.replace(':', "-")),
        RECORD_EXTENSION
    );

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file_name
    } else {
        format!("{prefix}/{file_name}")
    }
}

/// Prefix to list when loading every record under `prefix`.
pub fn list_prefix(prefix: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}/")
    }
}

/// Whether `key` names a vote record.
pub fn is_record_key(key: &str) -> bool {
    key.ends_with(RECORD_EXTENSION)
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_replaces_colons() {
        assert_eq!(
            record_key("vote_results", "J1", "2025-11-17T09:00:00Z"),
            "vote_results/J1_2025-11-17T09-00-00Z.json"
        );
    }

    #[test]
    fn test_record_key_sanitizes_path_characters() {
        assert_eq!(
            record_key("/vote_results/", "../J 1", "2025-11-17T09:00:00+00:00"),
            "vote_results/.._J_1_2025-11-17T09-00-00_00-00.json"
        );
    }

    #[test]
    fn test_record_key_without_prefix() {
        assert_eq!(record_key("", "J1", "t"), "J1_t.json");
    }

    #[test]
    fn test_list_prefix() {
        assert_eq!(list_prefix("vote_results"), "vote_results/");
        assert_eq!(list_prefix("/vote_results/"), "vote_results/");
        assert_eq!(list_prefix(""), "");
    }

    #[test]
    fn test_is_record_key() {
        assert!(is_record_key("vote_results/J1_t.json"));
        assert!(!is_record_key("vote_results/notes.txt"));
        assert!(!is_record_key("vote_results/J1_t.json.bak"));
    }
}
