//! Viewer: the public read API over one event source and an optional file
//! source.
//!
//! Every event query runs the same strictly sequential pipeline:
//!
//! ```text
//! resolve scope ──► fetch (timeout) ──► filter ──► sort ──► paginate
//! ```
//!
//! The viewer holds no per-request state; concurrent calls share only the
//! source handles.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::config::{Config, ViewerConfig};
use crate::error::{Result, ViewerError};
use crate::page::{paginate, Page};
use crate::query::{filter_events, EventFilter};
use crate::sort::{sort_events, sort_events_offloaded};
use crate::source::{EventSource, LogFileSource};
use crate::types::{LogEvent, LogFileInfo, QueryScope};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Knobs of the viewer pipeline, usually taken from [`ViewerConfig`].
#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub page_size: usize,
    pub timestamp_format: String,
    pub default_tenant: String,
    pub default_server_key: String,
    pub hidden_applications: Vec<String>,
    pub offload_sort: bool,
    pub event_timeout: Duration,
    pub file_timeout: Duration,
}

impl ViewerSettings {
    pub fn from_config(config: &Config) -> Self {
        let mut settings = Self::from(&config.viewer);
        settings.event_timeout = config.event_source.timeout();
        if let Some(files) = &config.file_source {
            settings.file_timeout = files.timeout();
        }
        settings
    }
}

impl From<&ViewerConfig> for ViewerSettings {
    fn from(viewer: &ViewerConfig) -> Self {
        Self {
            page_size: viewer.page_size,
            timestamp_format: viewer.timestamp_format.clone(),
            default_tenant: viewer.default_tenant.clone(),
            default_server_key: viewer.default_server_key.clone(),
            hidden_applications: viewer.hidden_applications.clone(),
            offload_sort: viewer.offload_sort,
            event_timeout: DEFAULT_TIMEOUT,
            file_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

#[derive(Clone)]
pub struct LogViewer {
    events: Arc<dyn EventSource>,
    files: Option<Arc<dyn LogFileSource>>,
    settings: ViewerSettings,
}

impl std::fmt::Debug for LogViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogViewer")
            .field("events", &self.events.name())
            .field("files", &self.files.as_ref().map(|s| s.name().to_string()))
            .field("settings", &self.settings)
            .finish()
    }
}

impl LogViewer {
    pub fn new(events: Arc<dyn EventSource>, settings: ViewerSettings) -> Self {
        Self {
            events,
            files: None,
            settings,
        }
    }

    pub fn with_file_source(mut self, files: Arc<dyn LogFileSource>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Event queries
    // -----------------------------------------------------------------------

    /// Events of every application inside `scope`, filtered and sorted
    /// newest first.
    pub async fn list_events(&self, severity: &str, keyword: &str, scope: &QueryScope) -> Result<Vec<LogEvent>> {
        let scope = scope.clone().without_application();
        self.query(&EventFilter::new(severity, keyword), &scope).await
    }

    /// Events of one application. An empty `app_name` is unconstrained.
    pub async fn list_application_logs(
        &self,
        severity: &str,
        keyword: &str,
        app_name: &str,
        scope: &QueryScope,
    ) -> Result<Vec<LogEvent>> {
        let scope = scope.clone().with_application(app_name);
        self.query(&EventFilter::new(severity, keyword), &scope).await
    }

    /// One page of [`list_events`](Self::list_events). `None` means nothing
    /// matched.
    pub async fn get_page(
        &self,
        page_number: usize,
        severity: &str,
        keyword: &str,
        scope: &QueryScope,
    ) -> Result<Option<Page<LogEvent>>> {
        let events = self.list_events(severity, keyword, scope).await?;
        Ok(paginate(events, page_number, self.settings.page_size))
    }

    /// One page of [`list_application_logs`](Self::list_application_logs).
    pub async fn get_application_page(
        &self,
        page_number: usize,
        severity: &str,
        keyword: &str,
        app_name: &str,
        scope: &QueryScope,
    ) -> Result<Option<Page<LogEvent>>> {
        let events = self.list_application_logs(severity, keyword, app_name, scope).await?;
        Ok(paginate(events, page_number, self.settings.page_size))
    }

    pub async fn list_application_names(&self, scope: &QueryScope) -> Result<Vec<String>> {
        let scope = self.resolve(scope).without_application();
        let hidden = &self.settings.hidden_applications;
        let names = self
            .bounded(
                self.events.name(),
                self.settings.event_timeout,
                self.events.fetch_application_names(&scope, hidden),
            )
            .await?;
        tracing::debug!(source = self.events.name(), count = names.len(), "listed applications");
        Ok(names)
    }

    pub async fn count_events(&self, scope: &QueryScope) -> Result<usize> {
        let scope = self.resolve(scope).without_application();
        self.bounded(self.events.name(), self.settings.event_timeout, self.events.count_events(&scope))
            .await
    }

    /// Clear the event source. `false` when the source cannot be cleared.
    pub async fn clear_events(&self) -> bool {
        let cleared = self.events.clear_events().await;
        tracing::info!(source = self.events.name(), cleared, "clear requested");
        cleared
    }

    /// Everything the event source holds, sorted newest first, ignoring
    /// tenant and server.
    pub async fn system_events(&self) -> Result<Vec<LogEvent>> {
        let events = self
            .bounded(self.events.name(), self.settings.event_timeout, self.events.system_events())
            .await?;
        self.sort(events).await
    }

    async fn query(&self, filter: &EventFilter, scope: &QueryScope) -> Result<Vec<LogEvent>> {
        let scope = self.resolve(scope);
        let fetched = self
            .bounded(self.events.name(), self.settings.event_timeout, self.events.fetch_events(&scope))
            .await?;
        let fetched_count = fetched.len();
        let filtered = filter_events(fetched, filter);
        let filtered_count = filtered.len();
        let sorted = self.sort(filtered).await?;
        tracing::debug!(
            source = self.events.name(),
            fetched = fetched_count,
            filtered = filtered_count,
            sorted = sorted.len(),
            "event query"
        );
        Ok(sorted)
    }

    async fn sort(&self, events: Vec<LogEvent>) -> Result<Vec<LogEvent>> {
        if self.settings.offload_sort {
            sort_events_offloaded(events, self.settings.timestamp_format.clone()).await
        } else {
            Ok(sort_events(events, &self.settings.timestamp_format))
        }
    }

    /// Fill unconstrained tenant / server from the configured defaults.
    fn resolve(&self, scope: &QueryScope) -> QueryScope {
        let defaults = QueryScope::new(&self.settings.default_tenant, &self.settings.default_server_key);
        QueryScope {
            tenant: scope.tenant.clone().or(defaults.tenant),
            server_key: scope.server_key.clone().or(defaults.server_key),
            app_name: scope.app_name.clone(),
        }
    }

    async fn bounded<T, F>(&self, backend: &str, timeout: Duration, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                tracing::error!(source = backend, %err, "source call failed");
                Err(err)
            }
            Err(_) => {
                tracing::error!(source = backend, ?timeout, "source call timed out");
                Err(ViewerError::unavailable(backend, format!("timed out after {timeout:?}")))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Log files
    // -----------------------------------------------------------------------

    fn file_source(&self) -> Result<&Arc<dyn LogFileSource>> {
        self.files
            .as_ref()
            .ok_or_else(|| ViewerError::unavailable("files", "no log file source configured"))
    }

    pub async fn list_log_files(&self, scope: &QueryScope) -> Result<Vec<LogFileInfo>> {
        let files = self.file_source()?;
        let scope = self.resolve(scope);
        self.bounded(files.name(), self.settings.file_timeout, files.list_files(&scope))
            .await
    }

    pub async fn get_log_file_page(&self, page_number: usize, scope: &QueryScope) -> Result<Option<Page<LogFileInfo>>> {
        let infos = self.list_log_files(scope).await?;
        Ok(paginate(infos, page_number, self.settings.page_size))
    }

    pub async fn download_log_file(&self, file_name: &str, scope: &QueryScope) -> Result<Bytes> {
        let files = self.file_source()?;
        let scope = self.resolve(scope);
        self.bounded(files.name(), self.settings.file_timeout, files.read_file(file_name, &scope))
            .await
    }

    pub async fn log_line_count(&self, file_name: &str, scope: &QueryScope) -> Result<usize> {
        let files = self.file_source()?;
        let scope = self.resolve(scope);
        self.bounded(files.name(), self.settings.file_timeout, files.line_count(file_name, &scope))
            .await
    }

    pub async fn log_lines(
        &self,
        file_name: &str,
        start: usize,
        end: usize,
        max: usize,
        scope: &QueryScope,
    ) -> Result<Vec<String>> {
        let files = self.file_source()?;
        let scope = self.resolve(scope);
        self.bounded(
            files.name(),
            self.settings.file_timeout,
            files.read_lines(file_name, start, end, max, &scope),
        )
        .await
    }
}
