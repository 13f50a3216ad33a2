//! File source: a log directory holding a live `<file_name>` plus rotated
//! `<file_name>.<YYYY-MM-DD>` files.
//!
//! Events are parsed from the live file one line at a time. A line that does
//! not match the line pattern continues the previous event's stack trace.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use tracing::{debug, warn};

use lav_core::{
    EventSource, LogEvent, LogFileInfo, LogFileSource, QueryScope, Result, SourceSettings, ViewerError,
};

pub const DEFAULT_FILE_NAME: &str = "server.log";

/// `TID: [tenant] [server] [app] [time] LEVEL {logger} - message`
pub const DEFAULT_LINE_PATTERN: &str = r"^TID: \[(?P<tenant>[^\]]*)\] \[(?P<server>[^\]]*)\] \[(?P<app>[^\]]*)\] \[(?P<time>[^\]]+)\]\s+(?P<level>[A-Z]+)\s+\{(?P<logger>[^}]*)\}\s+-\s+(?P<message>.*)$";

#[derive(Debug)]
pub struct FileLogSource {
    directory: PathBuf,
    file_name: String,
    line_pattern: Regex,
    rotated: Regex,
    tenant: Option<String>,
    server_key: Option<String>,
}

fn invalid(reason: impl ToString) -> ViewerError {
    ViewerError::unavailable("file", reason)
}

fn rotated_pattern(file_name: &str) -> Result<Regex> {
    Regex::new(&format!(r"^{}\.(\d{{4}}-\d{{2}}-\d{{2}})$", regex::escape(file_name)))
        .map_err(|e| invalid(e.to_string()))
}

impl FileLogSource {
    /// A source over `directory` using the default file name and line pattern.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            directory: directory.into(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            line_pattern: Regex::new(DEFAULT_LINE_PATTERN).map_err(|e| invalid(e.to_string()))?,
            rotated: rotated_pattern(DEFAULT_FILE_NAME)?,
            tenant: None,
            server_key: None,
        })
    }

    /// Properties: `directory` (required), `file_name`, `line_pattern`,
    /// `tenant`, `server_key`.
    pub fn from_settings(settings: &SourceSettings) -> Result<Self> {
        let directory = settings
            .property("directory")
            .ok_or_else(|| invalid("missing `directory` property"))?;
        let mut source = Self::new(directory)?;
        if let Some(file_name) = settings.property("file_name") {
            source = source.with_file_name(file_name)?;
        }
        if let Some(pattern) = settings.property("line_pattern") {
            source = source.with_line_pattern(pattern)?;
        }
        source.tenant = settings.property("tenant").map(str::to_string);
        source.server_key = settings.property("server_key").map(str::to_string);
        Ok(source)
    }

    pub fn with_file_name(mut self, file_name: &str) -> Result<Self> {
        self.rotated = rotated_pattern(file_name)?;
        self.file_name = file_name.to_string();
        Ok(self)
    }

    pub fn with_line_pattern(mut self, pattern: &str) -> Result<Self> {
        self.line_pattern = Regex::new(pattern).map_err(|e| invalid(format!("line_pattern: {e}")))?;
        Ok(self)
    }

    /// Only serve scopes whose tenant and server key match (when constrained).
    /// The server key is compared ignoring ASCII case.
    pub fn restricted_to(mut self, tenant: Option<&str>, server_key: Option<&str>) -> Self {
        self.tenant = tenant.map(str::to_string);
        self.server_key = server_key.map(str::to_string);
        self
    }

    /// Parse log text into events, in file order.
    pub fn parse_events(&self, content: &str) -> Vec<LogEvent> {
        let mut events: Vec<LogEvent> = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if let Some(caps) = self.line_pattern.captures(line) {
                let group = |name: &str| caps.name(name).map_or("", |m| m.as_str()).to_string();
                events.push(LogEvent {
                    tenant_id: group("tenant"),
                    server_name: group("server"),
                    app_name: LogEvent::normalize_app_name(caps.name("app").map_or("", |m| m.as_str())),
                    log_time: group("time"),
                    logger: group("logger"),
                    severity: group("level"),
                    message: group("message"),
                    ..LogEvent::default()
                });
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            match events.last_mut() {
                Some(last) => {
                    let trace = last.stack_trace.get_or_insert_with(String::new);
                    trace.push_str(line);
                    trace.push('\n');
                }
                None => warn!(line = index + 1, "skipping log line outside any event"),
            }
        }
        events
    }

    /// Tenants must match exactly, server keys ignoring ASCII case.
    fn serves(&self, scope: &QueryScope) -> bool {
        let tenant_ok = match (&self.tenant, &scope.tenant) {
            (Some(r), Some(q)) => r == q,
            _ => true,
        };
        let server_ok = match (&self.server_key, &scope.server_key) {
            (Some(r), Some(q)) => r.eq_ignore_ascii_case(q),
            _ => true,
        };
        tenant_ok && server_ok
    }

    /// `Some(date)` for a file this source manages, `None` otherwise.
    fn classify(&self, name: &str) -> Option<String> {
        if name == self.file_name {
            return Some(LogFileInfo::CURRENT.to_string());
        }
        self.rotated.captures(name).map(|caps| caps[1].to_string())
    }

    async fn ensure_directory(&self) -> Result<()> {
        match tokio::fs::metadata(&self.directory).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(invalid(format!("log directory {} not found", self.directory.display()))),
        }
    }

    /// Path of a managed file named by `file_name`'s base name.
    async fn resolve(&self, file_name: &str, scope: &QueryScope) -> Result<PathBuf> {
        let not_found = || ViewerError::FileNotFound(file_name.to_string());
        if !self.serves(scope) {
            return Err(not_found());
        }
        let base = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(not_found)?;
        self.classify(base).ok_or_else(not_found)?;
        self.ensure_directory().await?;

        let path = self.directory.join(base);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(not_found()),
        }
    }

    async fn read_text(&self, file_name: &str, scope: &QueryScope) -> Result<String> {
        let path = self.resolve(file_name, scope).await?;
        let raw = tokio::fs::read(&path).await?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    async fn live_events(&self) -> Result<Vec<LogEvent>> {
        self.ensure_directory().await?;
        let path = self.directory.join(&self.file_name);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(invalid(format!("{}: {e}", path.display()))),
        };
        let events = self.parse_events(&String::from_utf8_lossy(&raw));
        debug!(path = %path.display(), events = events.len(), "parsed live log file");
        Ok(events)
    }
}

#[async_trait]
impl EventSource for FileLogSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_events(&self, scope: &QueryScope) -> Result<Vec<LogEvent>> {
        let mut events = self.live_events().await?;
        events.retain(|e| scope.admits_event(e));
        Ok(events)
    }

    async fn system_events(&self) -> Result<Vec<LogEvent>> {
        self.live_events().await
    }
}

#[async_trait]
impl LogFileSource for FileLogSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn list_files(&self, scope: &QueryScope) -> Result<Vec<LogFileInfo>> {
        if !self.serves(scope) {
            return Ok(Vec::new());
        }
        self.ensure_directory().await?;

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let Some(date) = self.classify(&name) else {
                continue;
            };
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            files.push(LogFileInfo { name, date, size_bytes: meta.len() });
        }
        files.sort_by_cached_key(|f| f.name.to_lowercase());
        Ok(files)
    }

    async fn read_file(&self, file_name: &str, scope: &QueryScope) -> Result<Bytes> {
        let path = self.resolve(file_name, scope).await?;
        Ok(Bytes::from(tokio::fs::read(&path).await?))
    }

    async fn line_count(&self, file_name: &str, scope: &QueryScope) -> Result<usize> {
        Ok(self.read_text(file_name, scope).await?.lines().count())
    }

    async fn read_lines(
        &self,
        file_name: &str,
        start: usize,
        end: usize,
        max: usize,
        scope: &QueryScope,
    ) -> Result<Vec<String>> {
        let text = self.read_text(file_name, scope).await?;
        let wanted = end.saturating_sub(start).min(max);
        Ok(text.lines().skip(start).take(wanted).map(str::to_string).collect())
    }
}
