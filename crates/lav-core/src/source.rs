//! Backend contracts.
//!
//! An [`EventSource`] produces the unordered, unfiltered universe of events for
//! a scope; a [`LogFileSource`] exposes the raw log files behind a source. Any
//! implementation can back a [`LogViewer`](crate::viewer::LogViewer) without
//! changes to the filter, sort or paginate stages.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::query::application_names;
use crate::types::{LogEvent, LogFileInfo, QueryScope};

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// All events inside `scope`, in no particular order.
    ///
    /// Fails with `SourceUnavailable` when the store cannot be reached. A
    /// reachable store with no matching data yields an empty vec.
    async fn fetch_events(&self, scope: &QueryScope) -> Result<Vec<LogEvent>>;

    /// Distinct application names inside `scope`, minus `hidden` and the
    /// no-application sentinels, sorted ignoring case.
    async fn fetch_application_names(&self, scope: &QueryScope, hidden: &[String]) -> Result<Vec<String>> {
        let events = self.fetch_events(scope).await?;
        Ok(application_names(&events, hidden))
    }

    async fn count_events(&self, scope: &QueryScope) -> Result<usize> {
        Ok(self.fetch_events(scope).await?.len())
    }

    /// Drop every held event. Returns `false` when the source does not
    /// support clearing.
    async fn clear_events(&self) -> bool {
        false
    }

    /// Every event the source holds, regardless of tenant or server.
    async fn system_events(&self) -> Result<Vec<LogEvent>> {
        Ok(Vec::new())
    }
}

#[async_trait]
pub trait LogFileSource: Send + Sync {
    fn name(&self) -> &str;

    /// Log files visible to `scope`, sorted by name ignoring case. A scope the
    /// source does not serve gets an empty list.
    async fn list_files(&self, scope: &QueryScope) -> Result<Vec<LogFileInfo>>;

    /// Whole content of one file. Only the base name of `file_name` is used.
    async fn read_file(&self, file_name: &str, scope: &QueryScope) -> Result<Bytes>;

    async fn line_count(&self, file_name: &str, scope: &QueryScope) -> Result<usize>;

    /// Lines with zero-based index in `[start, end)`, at most `max` of them.
    async fn read_lines(
        &self,
        file_name: &str,
        start: usize,
        end: usize,
        max: usize,
        scope: &QueryScope,
    ) -> Result<Vec<String>>;
}
