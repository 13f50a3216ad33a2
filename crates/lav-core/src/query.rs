//! Query engine: severity and keyword filtering over a candidate set.
//!
//! The filter rules reproduce the log viewer's long-standing behaviour,
//! including one asymmetry: a keyword on its own also searches stack traces,
//! while a keyword combined with a concrete severity only searches the message
//! and logger.

use std::collections::HashSet;

use crate::types::{non_empty, LogEvent, NO_APPLICATION};

/// Reserved severity meaning "any severity". Matched case-insensitively.
pub const ALL_SEVERITIES: &str = "ALL";

/// Severity and keyword constraints of a query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventFilter {
    severity: Option<String>,
    keyword: Option<String>,
}

impl EventFilter {
    /// Build a filter from raw strings. Empty strings are unconstrained, and
    /// so is the [`ALL_SEVERITIES`] wildcard.
    pub fn new(severity: &str, keyword: &str) -> Self {
        let severity = non_empty(severity).filter(|s| !s.eq_ignore_ascii_case(ALL_SEVERITIES));
        Self {
            severity,
            keyword: non_empty(keyword).map(|k| k.to_lowercase()),
        }
    }

    pub fn severity(&self) -> Option<&str> {
        self.severity.as_deref()
    }

    /// The keyword, already lowercased.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.severity.is_none() && self.keyword.is_none()
    }

    /// Whether a single event passes this filter.
    pub fn matches(&self, event: &LogEvent) -> bool {
        match (&self.severity, &self.keyword) {
            (None, None) => true,
            (Some(severity), None) => event.severity == *severity,
            (None, Some(keyword)) => {
                contains_ci(&event.message, keyword)
                    || contains_ci(&event.logger, keyword)
                    || event
                        .stack_trace
                        .as_deref()
                        .is_some_and(|trace| contains_ci(trace, keyword))
            }
            (Some(severity), Some(keyword)) => {
                event.severity == *severity
                    && (contains_ci(&event.message, keyword) || contains_ci(&event.logger, keyword))
            }
        }
    }
}

/// Apply `filter` to `events`. An unconstrained filter returns the input
/// untouched; every other path keeps the input's relative order.
pub fn filter_events(events: Vec<LogEvent>, filter: &EventFilter) -> Vec<LogEvent> {
    if filter.is_unconstrained() {
        return events;
    }
    events.into_iter().filter(|e| filter.matches(e)).collect()
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Distinct application names seen in `events`, excluding the `"NA"`
/// sentinel, the empty name and every name in `hidden` (exact match).
///
/// The result is sorted alphabetically, ignoring case.
pub fn application_names<'a, I>(events: I, hidden: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = &'a LogEvent>,
{
    let hidden: HashSet<&str> = hidden.iter().map(String::as_str).collect();
    let distinct: HashSet<&str> = events
        .into_iter()
        .filter_map(|e| e.app_name.as_deref())
        .filter(|name| !name.is_empty() && *name != NO_APPLICATION && !hidden.contains(name))
        .collect();
    let mut names: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    // Exact-case tiebreak keeps the order deterministic across hash orders.
    names.sort_by_cached_key(|n| (n.to_lowercase(), n.clone()));
    names
}
