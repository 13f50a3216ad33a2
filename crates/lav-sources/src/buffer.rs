use std::collections::VecDeque;
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::RwLock;

/// One record captured in memory, before it is shaped into a `LogEvent`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferedRecord {
    pub tenant_id: String,
    pub server_key: String,
    /// Application name; `None` when the emitter had none.
    pub app_name: Option<String>,
    pub logged_at: NaiveDateTime,
    pub level: String,
    pub logger: String,
    pub message: String,
    /// Stack trace lines, when the record carried an error.
    pub stack_trace: Option<Vec<String>>,
    pub ip: String,
    pub instance: String,
}

/// Thread-safe bounded ring buffer of captured records
#[derive(Clone)]
pub struct RingBuffer {
    /// Internal storage, oldest first
    records: Arc<RwLock<VecDeque<BufferedRecord>>>,

    /// Maximum capacity
    capacity: usize,
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl RingBuffer {
    /// Create a new buffer with the given capacity (at least one record)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Push a new record, evicting the oldest if at capacity
    pub fn push(&self, record: BufferedRecord) {
        let mut records = self.records.write();
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// The `n` most recent records, newest first
    pub fn newest(&self, n: usize) -> Vec<BufferedRecord> {
        self.records.read().iter().rev().take(n).cloned().collect()
    }

    /// Number of records among the newest `n` satisfying `predicate`
    pub fn count_newest_where<F>(&self, n: usize, predicate: F) -> usize
    where
        F: Fn(&BufferedRecord) -> bool,
    {
        self.records.read().iter().rev().take(n).filter(|r| predicate(r)).count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Clear all records
    pub fn clear(&self) {
        self.records.write().clear();
    }
}
