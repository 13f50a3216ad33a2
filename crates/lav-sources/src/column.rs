//! Wide-column source.
//!
//! Events live in one table per tenant, server and day, named
//! `<prefix>_<tenant>_<server>_<yyyy_mm_dd>`. Each row holds named columns of
//! raw bytes; `logTime` is the event instant as 8-byte big-endian epoch
//! millis, every other column is UTF-8 text.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use lav_core::{
    check_timestamp_format, format_log_time, EventSource, LogEvent, MalformedRecord, QueryScope, Result,
    SourceSettings, ViewerError,
};

pub const DEFAULT_TABLE_PREFIX: &str = "log";
pub const DEFAULT_TENANT: &str = "0";
/// Upper bound on rows read per query.
pub const MAX_ROWS: usize = 40_000;

pub mod columns {
    pub const TENANT_ID: &str = "tenantID";
    pub const SERVER_NAME: &str = "serverName";
    pub const APP_NAME: &str = "appName";
    pub const LOG_TIME: &str = "logTime";
    pub const LOGGER: &str = "logger";
    pub const PRIORITY: &str = "priority";
    pub const MESSAGE: &str = "message";
    pub const IP: &str = "ip";
    pub const STACK_TRACE: &str = "stacktrace";
    pub const INSTANCE: &str = "instance";

    pub const ALL: [&str; 10] = [
        TENANT_ID, SERVER_NAME, APP_NAME, LOG_TIME, LOGGER, PRIORITY, MESSAGE, IP, STACK_TRACE, INSTANCE,
    ];
}

/// One stored row: its key and the raw value of each column it carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub key: String,
    pub columns: HashMap<String, Bytes>,
}

impl Row {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), columns: HashMap::new() }
    }

    pub fn with_text(mut self, column: &str, value: &str) -> Self {
        self.columns.insert(column.to_string(), Bytes::copy_from_slice(value.as_bytes()));
        self
    }

    pub fn with_millis(mut self, column: &str, millis: i64) -> Self {
        self.columns.insert(column.to_string(), Bytes::copy_from_slice(&millis.to_be_bytes()));
        self
    }

    /// A row holding every field of `event`; `logged_at` becomes `logTime`.
    pub fn from_event(key: impl Into<String>, event: &LogEvent, logged_at: DateTime<Utc>) -> Self {
        Self::new(key)
            .with_text(columns::TENANT_ID, &event.tenant_id)
            .with_text(columns::SERVER_NAME, &event.server_name)
            .with_text(columns::APP_NAME, event.app_name.as_deref().unwrap_or(lav_core::NO_APPLICATION))
            .with_millis(columns::LOG_TIME, logged_at.timestamp_millis())
            .with_text(columns::LOGGER, &event.logger)
            .with_text(columns::PRIORITY, &event.severity)
            .with_text(columns::MESSAGE, &event.message)
            .with_text(columns::IP, &event.ip)
            .with_text(columns::STACK_TRACE, event.stack_trace.as_deref().unwrap_or_default())
            .with_text(columns::INSTANCE, &event.instance)
    }

    fn text(&self, column: &str) -> std::result::Result<String, MalformedRecord> {
        match self.columns.get(column) {
            None => Ok(String::new()),
            Some(raw) => String::from_utf8(raw.to_vec())
                .map_err(|_| MalformedRecord::new(format!("column {column} is not UTF-8"))),
        }
    }

    fn millis(&self, column: &str) -> std::result::Result<i64, MalformedRecord> {
        let raw = self
            .columns
            .get(column)
            .ok_or_else(|| MalformedRecord::new(format!("missing column {column}")))?;
        let bytes: [u8; 8] = raw
            .as_ref()
            .try_into()
            .map_err(|_| MalformedRecord::new(format!("column {column} holds {} bytes, want 8", raw.len())))?;
        Ok(i64::from_be_bytes(bytes))
    }
}

/// A wide-column store reachable asynchronously.
#[async_trait]
pub trait ColumnStore: Send + Sync {
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Up to `limit` rows of `table`, each restricted to `columns`.
    async fn scan(&self, table: &str, columns: &[&str], limit: usize) -> Result<Vec<Row>>;

    /// Number of rows in `table`.
    async fn count(&self, table: &str) -> Result<usize>;
}

/// Turn one stored row into an event, formatting `logTime` with
/// `timestamp_format`.
pub fn decode_row(row: &Row, timestamp_format: &str) -> std::result::Result<LogEvent, MalformedRecord> {
    let millis = row.millis(columns::LOG_TIME)?;
    let logged_at = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| MalformedRecord::new(format!("logTime {millis} out of range")))?;
    let stack_trace = row.text(columns::STACK_TRACE)?;

    Ok(LogEvent {
        tenant_id: row.text(columns::TENANT_ID)?,
        server_name: row.text(columns::SERVER_NAME)?,
        app_name: LogEvent::normalize_app_name(&row.text(columns::APP_NAME)?),
        log_time: format_log_time(&logged_at.naive_utc(), timestamp_format)?,
        logger: row.text(columns::LOGGER)?,
        severity: row.text(columns::PRIORITY)?,
        message: row.text(columns::MESSAGE)?,
        stack_trace: (!stack_trace.is_empty()).then_some(stack_trace),
        ip: row.text(columns::IP)?,
        instance: row.text(columns::INSTANCE)?,
        key: Some(row.key.clone()),
    })
}

pub struct ColumnStoreEventSource<S> {
    store: S,
    table_prefix: String,
    server_key: String,
    max_rows: usize,
    date: Option<NaiveDate>,
    timestamp_format: String,
}

impl<S: ColumnStore> ColumnStoreEventSource<S> {
    pub fn new(store: S, server_key: impl Into<String>, timestamp_format: impl Into<String>) -> Self {
        Self {
            store,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            server_key: server_key.into(),
            max_rows: MAX_ROWS,
            date: None,
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Properties: `table_prefix`, `server_key`, `max_rows`, `date`
    /// (`YYYY-MM-DD`, pins the day instead of today).
    pub fn from_settings(store: S, settings: &SourceSettings, timestamp_format: &str) -> Result<Self> {
        check_timestamp_format(timestamp_format)?;
        let mut source = Self::new(store, settings.property("server_key").unwrap_or_default(), timestamp_format);
        if let Some(prefix) = settings.property("table_prefix") {
            source.table_prefix = prefix.to_string();
        }
        if let Some(max_rows) = settings.property("max_rows") {
            source.max_rows = max_rows
                .parse()
                .map_err(|e| ViewerError::unavailable("column", format!("max_rows {max_rows:?}: {e}")))?;
        }
        if let Some(date) = settings.property("date") {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| ViewerError::unavailable("column", format!("date {date:?}: {e}")))?;
            source.date = Some(date);
        }
        Ok(source)
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Table holding the events of `scope` for the configured (or current) day.
    pub fn table_name(&self, scope: &QueryScope) -> String {
        let tenant = scope.tenant.as_deref().unwrap_or(DEFAULT_TENANT);
        let server = scope.server_key.as_deref().unwrap_or(&self.server_key);
        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());
        format!("{}_{}_{}_{}", self.table_prefix, tenant, server, date.format("%Y_%m_%d"))
    }
}

#[async_trait]
impl<S: ColumnStore> EventSource for ColumnStoreEventSource<S> {
    fn name(&self) -> &str {
        "column"
    }

    async fn fetch_events(&self, scope: &QueryScope) -> Result<Vec<LogEvent>> {
        check_timestamp_format(&self.timestamp_format)?;
        let table = self.table_name(scope);
        if !self.store.table_exists(&table).await? {
            debug!(%table, "no table for scope");
            return Ok(Vec::new());
        }

        let rows = self.store.scan(&table, &columns::ALL, self.max_rows).await?;
        let events: Vec<LogEvent> = rows
            .iter()
            .filter_map(|row| match decode_row(row, &self.timestamp_format) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(%table, key = %row.key, error = %e, "skipping row");
                    None
                }
            })
            .filter(|event| match &scope.app_name {
                Some(app) => event.app_name.as_deref() == Some(app.as_str()),
                None => true,
            })
            .collect();
        debug!(%table, rows = rows.len(), events = events.len(), "scanned table");
        Ok(events)
    }

    async fn count_events(&self, scope: &QueryScope) -> Result<usize> {
        if scope.app_name.is_some() {
            return Ok(self.fetch_events(scope).await?.len());
        }
        let table = self.table_name(scope);
        if !self.store.table_exists(&table).await? {
            return Ok(0);
        }
        self.store.count(&table).await
    }
}
