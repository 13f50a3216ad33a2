//! Memory source: serves events captured in a [`RingBuffer`].
//!
//! Records are shaped into events through a column layout such as
//! `%T,%S,%A,%d,%c,%p,%m,%I,Stacktrace,%H`: only the listed fields are copied,
//! the rest stay empty.

use async_trait::async_trait;
use lav_core::{
    check_timestamp_format, format_log_time, EventSource, LogEvent, MalformedRecord, QueryScope, Result,
    SourceSettings, ViewerError, NO_APPLICATION,
};

use crate::buffer::{BufferedRecord, RingBuffer};

/// Layout used when the `columns` property is absent.
pub const DEFAULT_COLUMNS: &str = "%T,%S,%A,%d,%c,%p,%m,%I,Stacktrace,%H";

/// Records read per query when the `read_limit` property is absent or not
/// positive.
pub const DEFAULT_READ_LIMIT: usize = 100;

/// One field of the column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    TenantId,
    ServerName,
    AppName,
    LogTime,
    Logger,
    Severity,
    Message,
    Instance,
    StackTrace,
    Ip,
}

impl Column {
    fn parse(token: &str) -> Option<Self> {
        match token.trim().trim_start_matches('%') {
            "T" => Some(Self::TenantId),
            "S" => Some(Self::ServerName),
            "A" => Some(Self::AppName),
            "d" => Some(Self::LogTime),
            "c" => Some(Self::Logger),
            "p" => Some(Self::Severity),
            "m" => Some(Self::Message),
            "I" => Some(Self::Instance),
            "Stacktrace" => Some(Self::StackTrace),
            "H" => Some(Self::Ip),
            _ => None,
        }
    }
}

/// Parse a comma-separated column layout. Unknown tokens are an error.
pub fn parse_columns(layout: &str) -> std::result::Result<Vec<Column>, String> {
    layout
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .map(|token| Column::parse(token).ok_or_else(|| format!("unknown column {:?}", token.trim())))
        .collect()
}

pub struct MemoryEventSource {
    buffer: Option<RingBuffer>,
    columns: Vec<Column>,
    read_limit: usize,
    timestamp_format: String,
}

impl MemoryEventSource {
    pub fn new(buffer: Option<RingBuffer>, timestamp_format: impl Into<String>) -> Self {
        Self {
            buffer,
            columns: parse_columns(DEFAULT_COLUMNS).unwrap_or_default(),
            read_limit: DEFAULT_READ_LIMIT,
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Build from `[event_source]` settings. Properties: `columns` (layout),
    /// `read_limit` (records per query, non-positive means the default).
    pub fn from_settings(
        settings: &SourceSettings,
        buffer: Option<RingBuffer>,
        timestamp_format: &str,
    ) -> Result<Self> {
        check_timestamp_format(timestamp_format)?;
        let mut source = Self::new(buffer, timestamp_format);
        if let Some(layout) = settings.property("columns") {
            source.columns = parse_columns(layout).map_err(|e| ViewerError::unavailable("memory", e))?;
        }
        if let Some(limit) = settings.property("read_limit") {
            let limit: i64 = limit
                .parse()
                .map_err(|e| ViewerError::unavailable("memory", format!("read_limit {limit:?}: {e}")))?;
            source.read_limit = if limit < 1 { DEFAULT_READ_LIMIT } else { limit as usize };
        }
        Ok(source)
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_read_limit(mut self, read_limit: usize) -> Self {
        self.read_limit = if read_limit == 0 { DEFAULT_READ_LIMIT } else { read_limit };
        self
    }

    fn buffer(&self) -> Result<&RingBuffer> {
        self.buffer
            .as_ref()
            .ok_or_else(|| ViewerError::unavailable("memory", "no ring buffer configured"))
    }

    fn to_event(&self, record: &BufferedRecord) -> std::result::Result<LogEvent, MalformedRecord> {
        let mut event = LogEvent::default();
        for column in &self.columns {
            match column {
                Column::TenantId => event.tenant_id = record.tenant_id.clone(),
                Column::ServerName => event.server_name = record.server_key.clone(),
                Column::AppName => {
                    event.app_name =
                        LogEvent::normalize_app_name(record.app_name.as_deref().unwrap_or(NO_APPLICATION))
                }
                Column::LogTime => {
                    event.log_time = format_log_time(&record.logged_at, &self.timestamp_format)?
                }
                Column::Logger => event.logger = record.logger.clone(),
                Column::Severity => event.severity = record.level.clone(),
                Column::Message => event.message = record.message.clone(),
                Column::Instance => event.instance = record.instance.clone(),
                Column::StackTrace => {
                    event.stack_trace = record.stack_trace.as_ref().map(|lines| {
                        let mut trace = lines.join("\n");
                        trace.push('\n');
                        trace
                    })
                }
                Column::Ip => event.ip = record.ip.clone(),
            }
        }
        Ok(event)
    }

    /// Shape `records` into events, skipping any that cannot be rendered.
    fn to_events<'a>(&self, records: impl Iterator<Item = &'a BufferedRecord>) -> Result<Vec<LogEvent>> {
        check_timestamp_format(&self.timestamp_format)?;
        Ok(records
            .filter_map(|record| match self.to_event(record) {
                Ok(event) => Some(event),
                Err(err) => {
                    tracing::warn!(logger = %record.logger, %err, "skipping record");
                    None
                }
            })
            .collect())
    }
}

fn in_scope(scope: &QueryScope, record: &BufferedRecord) -> bool {
    scope.admits(&record.tenant_id, &record.server_key, record.app_name.as_deref())
}

#[async_trait]
impl EventSource for MemoryEventSource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_events(&self, scope: &QueryScope) -> Result<Vec<LogEvent>> {
        let records = self.buffer()?.newest(self.read_limit);
        self.to_events(records.iter().filter(|r| in_scope(scope, r)))
    }

    /// Counts only the newest `read_limit` records, the same window
    /// [`fetch_events`](EventSource::fetch_events) reads.
    async fn count_events(&self, scope: &QueryScope) -> Result<usize> {
        Ok(self.buffer()?.count_newest_where(self.read_limit, |r| in_scope(scope, r)))
    }

    async fn clear_events(&self) -> bool {
        match &self.buffer {
            Some(buffer) => {
                buffer.clear();
                true
            }
            None => false,
        }
    }

    async fn system_events(&self) -> Result<Vec<LogEvent>> {
        let records = self.buffer()?.newest(self.read_limit);
        self.to_events(records.iter())
    }
}
