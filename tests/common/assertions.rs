//! Domain-specific assertion macros for lav harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that name the
//! pipeline invariant that was violated.

/// Assert that events are ordered newest first under the default timestamp
/// format.
///
/// ```rust
/// assert_newest_first!(events);
/// ```
#[macro_export]
macro_rules! assert_newest_first {
    ($events:expr) => {{
        let events: &[lav::LogEvent] = &$events;
        for pair in events.windows(2) {
            let a = lav::parse_log_time(&pair[0].log_time, lav::DEFAULT_TIMESTAMP_FORMAT)
                .expect("sorted output holds parseable times");
            let b = lav::parse_log_time(&pair[1].log_time, lav::DEFAULT_TIMESTAMP_FORMAT)
                .expect("sorted output holds parseable times");
            if a < b {
                panic!(
                    "assert_newest_first! failed:\n  {:?} ({})\n  precedes\n  {:?} ({})",
                    pair[0].message, pair[0].log_time, pair[1].message, pair[1].log_time
                );
            }
        }
    }};
}

/// Assert that every event carries the given severity.
#[macro_export]
macro_rules! assert_all_severity {
    ($events:expr, $severity:expr) => {{
        let events: &[lav::LogEvent] = &$events;
        let expected: &str = $severity;
        if let Some(bad) = events.iter().find(|e| e.severity != expected) {
            panic!(
                "assert_all_severity! failed: expected {:?}, found {:?} on {:?}",
                expected, bad.severity, bad.message
            );
        }
    }};
}

/// Assert the messages of `events`, in order.
///
/// ```rust
/// assert_messages!(events, ["event 2", "event 1"]);
/// ```
#[macro_export]
macro_rules! assert_messages {
    ($events:expr, [$($message:expr),* $(,)?]) => {{
        let events = &$events;
        let actual: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
        let expected: Vec<&str> = vec![$($message),*];
        pretty_assertions::assert_eq!(actual, expected);
    }};
}

/// Assert page number, page count and item count of a `Some(Page)`.
#[macro_export]
macro_rules! assert_page {
    ($page:expr, number = $number:expr, of = $total:expr, items = $items:expr) => {{
        let page_value = &$page;
        let page = page_value.as_ref().expect("assert_page! got no page");
        pretty_assertions::assert_eq!(
            (page.page_number, page.total_pages, page.items.len()),
            ($number, $total, $items),
            "(page_number, total_pages, items)"
        );
    }};
}
