//! lav-core: Log Aggregation Viewer core library.
//!
//! This crate holds the normalised event model and the query pipeline that
//! every backend shares, plus the contracts backends implement.
//!
//! # Architecture
//!
//! ```text
//! EventSource ──► Query ──► Sort ──► Page
//!      │                               │
//!      └────────── LogViewer ──────────┘
//! ```
//!
//! Sources live in `lav-sources`; this crate never touches a backend
//! directly.

pub mod config;
pub mod error;
pub mod page;
pub mod query;
pub mod sort;
pub mod source;
pub mod types;
pub mod viewer;

pub use config::{Config, SourceSettings, ViewerConfig};
pub use error::{MalformedRecord, Result, ViewerError};
pub use page::{paginate, Page};
pub use query::{application_names, filter_events, EventFilter, ALL_SEVERITIES};
pub use sort::{check_timestamp_format, format_log_time, parse_log_time, sort_events, DEFAULT_TIMESTAMP_FORMAT};
pub use source::{EventSource, LogFileSource};
pub use types::{LogEvent, LogFileInfo, QueryScope, NO_APPLICATION};
pub use viewer::{LogViewer, ViewerSettings};
