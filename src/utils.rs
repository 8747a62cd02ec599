//! Utility functions: publish-time parsing, request-header rotation, and
//! string helpers for logging.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rand::Rng;
use thiserror::Error;

/// Raised when a raw publish-time string matches none of the known formats.
///
/// The error is local to the field: the relational sink stores NULL and
/// keeps the item.
#[derive(Debug, Error, PartialEq)]
#[error("unrecognized publish time format: {0:?}")]
pub struct TimeParseError(pub String);

/// Formats carrying both a date and a time component, in descending
/// specificity: Chinese-dot notation, dash, slash, compact, then the
/// 12/24-hour and English month-name variants.
const DATETIME_FORMATS: &[&str] = &[
    "%Y年%m月%d日 %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y%m%d %H:%M:%S",
    "%Y年%m月%d日 %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y%m%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %I:%M:%S %p",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %I:%M:%S %p",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %I:%M:%S %p",
];

/// Date-only formats; the parsed date is taken at midnight.
const DATE_FORMATS: &[&str] = &["%Y年%m月%d日", "%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Convert a raw publish-time string into a structured timestamp.
///
/// Tries an ISO-8601 parse first, then the descending format lists above.
///
/// # Errors
///
/// Returns [`TimeParseError`] when no format matches.
pub fn parse_publish_time(raw: &str) -> Result<NaiveDateTime, TimeParseError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }

    Err(TimeParseError(s.to_string()))
}

/// Browser User-Agent pool rotated across outbound requests.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.120 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/91.0.864.59",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36",
    "Mozilla/5.0 (iPad; CPU OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36 Edg/91.0.864.59",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
];

/// Pick a random User-Agent from the pool.
pub fn random_user_agent() -> &'static str {
    let idx = rand::rng().random_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// Millisecond timestamp string, used as the cache-buster parameter some
/// list endpoints expect.
pub fn millis_timestamp() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Today's date formatted `YYYYMMDD` (the `top_time` parameter shape).
pub fn compact_date() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte
/// count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_chinese_dot_notation() {
        assert_eq!(
            parse_publish_time("2025年01月24日 13:28:33").unwrap(),
            dt(2025, 1, 24, 13, 28, 33)
        );
        assert_eq!(
            parse_publish_time("2025年01月24日 13:28").unwrap(),
            dt(2025, 1, 24, 13, 28, 0)
        );
        assert_eq!(
            parse_publish_time("2025年01月24日").unwrap(),
            dt(2025, 1, 24, 0, 0, 0)
        );
    }

    #[test]
    fn test_parse_iso_first() {
        assert_eq!(
            parse_publish_time("2025-01-24T13:28:33").unwrap(),
            dt(2025, 1, 24, 13, 28, 33)
        );
        assert_eq!(
            parse_publish_time("2025-01-24T13:28:33+08:00").unwrap(),
            dt(2025, 1, 24, 13, 28, 33)
        );
    }

    #[test]
    fn test_parse_slash_and_compact() {
        assert_eq!(
            parse_publish_time("2025/01/24 13:28:33").unwrap(),
            dt(2025, 1, 24, 13, 28, 33)
        );
        assert_eq!(
            parse_publish_time("20250124 13:28").unwrap(),
            dt(2025, 1, 24, 13, 28, 0)
        );
        assert_eq!(
            parse_publish_time("20250124").unwrap(),
            dt(2025, 1, 24, 0, 0, 0)
        );
    }

    #[test]
    fn test_parse_english_month_and_12_hour() {
        assert_eq!(
            parse_publish_time("Jan 24, 2025 01:28:33 PM").unwrap(),
            dt(2025, 1, 24, 13, 28, 33)
        );
        assert_eq!(
            parse_publish_time("24 Jan 2025 13:28:33").unwrap(),
            dt(2025, 1, 24, 13, 28, 33)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_publish_time("yesterday-ish").unwrap_err();
        assert_eq!(err, TimeParseError("yesterday-ish".to_string()));
        assert!(parse_publish_time("").is_err());
    }

    #[test]
    fn test_random_user_agent_in_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 100), "short");
        let long = "a".repeat(500);
        let result = truncate_for_log(&long, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_multibyte_boundary() {
        // Must not split inside a multi-byte character.
        let s = "新闻标题新闻标题";
        let result = truncate_for_log(s, 4);
        assert!(result.starts_with('新'));
    }
}
