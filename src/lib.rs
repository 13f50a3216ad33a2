//! lav: Log Aggregation Viewer
//!
//! Tenant-scoped query, filtering, newest-first sorting and pagination of log
//! events held by pluggable backends. This crate re-exports the two layers so
//! that integration tests and embedding hosts can import them from one place.
//!
//! # Architecture
//!
//! ```text
//! Config ──► SourceRegistry ──► EventSource / LogFileSource
//!                                      │
//!                     LogViewer ◄──────┘  (filter ──► sort ──► page)
//! ```

pub use lav_core::*;
pub use lav_sources as sources;
pub use lav_sources::{SourceContext, SourceRegistry};

/// Build a viewer from `config` using the built-in providers.
pub fn build_viewer(config: &Config, ctx: &SourceContext) -> Result<LogViewer> {
    build_viewer_with(&SourceRegistry::with_builtins(), config, ctx)
}

/// Build a viewer from `config`, resolving provider kinds through `registry`.
///
/// The config is validated first. The event source is required. The file source is optional; without one
/// the viewer's log-file operations report the source as unavailable.
pub fn build_viewer_with(registry: &SourceRegistry, config: &Config, ctx: &SourceContext) -> Result<LogViewer> {
    config.validate()?;
    let ctx = ctx.clone().with_timestamp_format(config.viewer.timestamp_format.clone());
    let events = registry.build_event_source(&config.event_source, &ctx)?;
    let mut viewer = LogViewer::new(events, ViewerSettings::from_config(config));
    if let Some(files) = &config.file_source {
        viewer = viewer.with_file_source(registry.build_file_source(files, &ctx)?);
    }
    tracing::debug!(?viewer, "viewer ready");
    Ok(viewer)
}
