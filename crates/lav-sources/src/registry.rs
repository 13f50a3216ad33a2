//! Provider registry: maps the `kind` string of a `[event_source]` /
//! `[file_source]` section to a factory building the source.
//!
//! Built-in event providers are `memory`, `file` and `sqlite`; the built-in
//! file provider is `file`. Hosts can register their own under any other name
//! (or replace a built-in).

use std::collections::HashMap;
use std::sync::Arc;

use lav_core::{EventSource, LogFileSource, Result, SourceSettings, ViewerError, DEFAULT_TIMESTAMP_FORMAT};

use crate::buffer::RingBuffer;
use crate::column::ColumnStoreEventSource;
use crate::file::FileLogSource;
use crate::memory::MemoryEventSource;
use crate::sqlite::SqliteColumnStore;

/// Host-provided state a factory may need besides its settings.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Ring buffer fed by [`BufferLayer`](crate::appender::BufferLayer), if the
    /// host installed one.
    pub buffer: Option<RingBuffer>,
    pub timestamp_format: String,
}

impl Default for SourceContext {
    fn default() -> Self {
        Self {
            buffer: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl SourceContext {
    pub fn with_buffer(mut self, buffer: RingBuffer) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }
}

pub type EventSourceFactory =
    Box<dyn Fn(&SourceSettings, &SourceContext) -> Result<Arc<dyn EventSource>> + Send + Sync>;
pub type FileSourceFactory =
    Box<dyn Fn(&SourceSettings, &SourceContext) -> Result<Arc<dyn LogFileSource>> + Send + Sync>;

#[derive(Default)]
pub struct SourceRegistry {
    events: HashMap<String, EventSourceFactory>,
    files: HashMap<String, FileSourceFactory>,
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut events: Vec<_> = self.events.keys().collect();
        let mut files: Vec<_> = self.files.keys().collect();
        events.sort();
        files.sort();
        f.debug_struct("SourceRegistry")
            .field("events", &events)
            .field("files", &files)
            .finish()
    }
}

impl SourceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in providers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_event_source("memory", |settings, ctx| {
            let source = MemoryEventSource::from_settings(settings, ctx.buffer.clone(), &ctx.timestamp_format)?;
            Ok(Arc::new(source) as Arc<dyn EventSource>)
        });
        registry.register_event_source("file", |settings, _ctx| {
            Ok(Arc::new(FileLogSource::from_settings(settings)?) as Arc<dyn EventSource>)
        });
        registry.register_event_source("sqlite", |settings, ctx| {
            let store = SqliteColumnStore::from_settings(settings)?;
            let source = ColumnStoreEventSource::from_settings(store, settings, &ctx.timestamp_format)?;
            Ok(Arc::new(source) as Arc<dyn EventSource>)
        });
        registry.register_file_source("file", |settings, _ctx| {
            Ok(Arc::new(FileLogSource::from_settings(settings)?) as Arc<dyn LogFileSource>)
        });
        registry
    }

    pub fn register_event_source<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&SourceSettings, &SourceContext) -> Result<Arc<dyn EventSource>> + Send + Sync + 'static,
    {
        self.events.insert(kind.to_string(), Box::new(factory));
    }

    pub fn register_file_source<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&SourceSettings, &SourceContext) -> Result<Arc<dyn LogFileSource>> + Send + Sync + 'static,
    {
        self.files.insert(kind.to_string(), Box::new(factory));
    }

    pub fn build_event_source(&self, settings: &SourceSettings, ctx: &SourceContext) -> Result<Arc<dyn EventSource>> {
        let factory = self
            .events
            .get(&settings.kind)
            .ok_or_else(|| ViewerError::unavailable(&settings.kind, "unknown event source kind"))?;
        tracing::debug!(kind = %settings.kind, "building event source");
        factory(settings, ctx)
    }

    pub fn build_file_source(&self, settings: &SourceSettings, ctx: &SourceContext) -> Result<Arc<dyn LogFileSource>> {
        let factory = self
            .files
            .get(&settings.kind)
            .ok_or_else(|| ViewerError::unavailable(&settings.kind, "unknown file source kind"))?;
        tracing::debug!(kind = %settings.kind, "building file source");
        factory(settings, ctx)
    }
}
