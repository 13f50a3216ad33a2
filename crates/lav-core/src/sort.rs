//! Sorter: orders events most-recent-first by their parsed timestamp.
//!
//! Each call owns its input. Events whose timestamp does not parse with the
//! configured format are dropped individually and logged; they never abort
//! the sort.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;

use crate::error::{MalformedRecord, Result, ViewerError};
use crate::types::LogEvent;

/// Default fixed timestamp format (`2024-01-15 10:00:00,123`).
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Parse an event time written in `format`.
pub fn parse_log_time(raw: &str, format: &str) -> Result<NaiveDateTime, MalformedRecord> {
    NaiveDateTime::parse_from_str(raw.trim(), format)
        .map_err(|e| MalformedRecord::new(format!("unparseable timestamp {raw:?}: {e}")))
}

/// Reject a timestamp format containing a specifier chrono does not know.
/// Such a format can neither render nor parse any time.
pub fn check_timestamp_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ViewerError::Config(config::ConfigError::Message(format!(
            "invalid timestamp_format {format:?}"
        ))));
    }
    Ok(())
}

/// Render `time` in `format`.
pub fn format_log_time(time: &NaiveDateTime, format: &str) -> Result<String, MalformedRecord> {
    let mut out = String::new();
    write!(out, "{}", time.format(format))
        .map_err(|_| MalformedRecord::new(format!("cannot render time with format {format:?}")))?;
    Ok(out)
}

/// Stable descending sort on the parsed timestamp. Ties keep their input
/// order, so sorting an already sorted list is a no-op.
pub fn sort_events(events: Vec<LogEvent>, format: &str) -> Vec<LogEvent> {
    let mut keyed: Vec<(NaiveDateTime, LogEvent)> = events
        .into_iter()
        .filter_map(|event| match parse_log_time(&event.log_time, format) {
            Ok(ts) => Some((ts, event)),
            Err(err) => {
                tracing::warn!(logger = %event.logger, %err, "skipping event");
                None
            }
        })
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, event)| event).collect()
}

/// [`sort_events`] on the blocking pool, so a large sort does not stall the
/// async worker that is also waiting on slow sources.
pub async fn sort_events_offloaded(events: Vec<LogEvent>, format: String) -> Result<Vec<LogEvent>> {
    tokio::task::spawn_blocking(move || sort_events(events, &format))
        .await
        .map_err(|e| ViewerError::TaskFailed(e.to_string()))
}
