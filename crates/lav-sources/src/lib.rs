//! lav-sources: backend adapters for the log viewer.
//!
//! | Module | Backend |
//! |---|---|
//! | [`buffer`] / [`appender`] | in-process ring buffer fed by a `tracing` layer |
//! | [`memory`] | events read back from the ring buffer |
//! | [`file`] | live and rotated log files in a directory |
//! | [`column`] / [`sqlite`] | wide-column tables, one per tenant, server and day |
//!
//! [`registry::SourceRegistry`] builds any of them from configuration.

pub mod appender;
pub mod buffer;
pub mod column;
pub mod file;
pub mod memory;
pub mod registry;
pub mod sqlite;

pub use appender::BufferLayer;
pub use buffer::{BufferedRecord, RingBuffer};
pub use column::{ColumnStore, ColumnStoreEventSource, Row};
pub use file::FileLogSource;
pub use memory::MemoryEventSource;
pub use registry::{SourceContext, SourceRegistry};
pub use sqlite::SqliteColumnStore;
