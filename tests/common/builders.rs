//! Test builders: ergonomic constructors for `LogEvent`, viewers and
//! in-memory sources.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use lav::{EventSource, LogEvent, LogViewer, QueryScope, Result, ViewerError, ViewerSettings, DEFAULT_TIMESTAMP_FORMAT};

// ---------------------------------------------------------------------------
// EventBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`LogEvent`] test fixtures.
///
/// # Example
///
/// ```rust
/// let event = EventBuilder::new("payment gateway timeout")
///     .severity("ERROR")
///     .app("billing")
///     .at(base_time() + Duration::seconds(3))
///     .build();
/// ```
#[derive(Clone)]
pub struct EventBuilder {
    event: LogEvent,
}

impl EventBuilder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            event: LogEvent {
                tenant_id: "0".to_string(),
                server_name: "AS".to_string(),
                app_name: None,
                log_time: format_time(base_time()),
                logger: "org.example.Service".to_string(),
                severity: "INFO".to_string(),
                message: message.into(),
                stack_trace: None,
                ip: "10.0.0.1".to_string(),
                instance: "node-1".to_string(),
                key: None,
            },
        }
    }

    pub fn tenant(mut self, tenant: &str) -> Self {
        self.event.tenant_id = tenant.to_string();
        self
    }

    pub fn server(mut self, server: &str) -> Self {
        self.event.server_name = server.to_string();
        self
    }

    pub fn app(mut self, app: &str) -> Self {
        self.event.app_name = LogEvent::normalize_app_name(app);
        self
    }

    pub fn severity(mut self, severity: &str) -> Self {
        self.event.severity = severity.to_string();
        self
    }

    pub fn logger(mut self, logger: &str) -> Self {
        self.event.logger = logger.to_string();
        self
    }

    pub fn stack_trace(mut self, trace: &str) -> Self {
        self.event.stack_trace = Some(trace.to_string());
        self
    }

    pub fn at(mut self, time: NaiveDateTime) -> Self {
        self.event.log_time = format_time(time);
        self
    }

    /// Seconds after [`base_time`].
    pub fn at_second(self, offset: i64) -> Self {
        self.at(base_time() + Duration::seconds(offset))
    }

    /// Set the raw, possibly unparseable, time string.
    pub fn raw_time(mut self, raw: &str) -> Self {
        self.event.log_time = raw.to_string();
        self
    }

    pub fn build(self) -> LogEvent {
        self.event
    }
}

/// 2024-01-15 10:00:00.000, the reference instant of every fixture.
pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

pub fn format_time(time: NaiveDateTime) -> String {
    time.format(DEFAULT_TIMESTAMP_FORMAT).to_string()
}

/// `n` INFO events one second apart, messages `event 0` .. `event n-1`.
pub fn numbered_events(n: usize) -> Vec<LogEvent> {
    (0..n)
        .map(|i| EventBuilder::new(format!("event {i}")).at_second(i as i64).build())
        .collect()
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// An event source serving a fixed set of events, applying the scope the way
/// a real backend would.
pub struct StaticSource {
    events: Vec<LogEvent>,
}

impl StaticSource {
    pub fn new(events: Vec<LogEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl EventSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_events(&self, scope: &QueryScope) -> Result<Vec<LogEvent>> {
        Ok(self.events.iter().filter(|e| scope.admits_event(e)).cloned().collect())
    }

    async fn system_events(&self) -> Result<Vec<LogEvent>> {
        Ok(self.events.clone())
    }
}

/// An event source whose store is unreachable.
pub struct DownSource;

#[async_trait]
impl EventSource for DownSource {
    fn name(&self) -> &str {
        "down"
    }

    async fn fetch_events(&self, _scope: &QueryScope) -> Result<Vec<LogEvent>> {
        Err(ViewerError::unavailable("down", "connection refused"))
    }
}

// ---------------------------------------------------------------------------
// Viewers
// ---------------------------------------------------------------------------

/// Settings with `page_size` and in-place sorting.
pub fn settings(page_size: usize) -> ViewerSettings {
    ViewerSettings {
        page_size,
        offload_sort: false,
        ..ViewerSettings::default()
    }
}

pub fn viewer_over(events: Vec<LogEvent>, page_size: usize) -> LogViewer {
    LogViewer::new(Arc::new(StaticSource::new(events)), settings(page_size))
}
