//! Core types for lav-core.
//!
//! This module defines the data structures shared across every layer: the
//! normalised [`LogEvent`], the [`QueryScope`] a read is constrained to, and
//! the [`LogFileInfo`] metadata exposed by file-backed sources.

use serde::Serialize;

/// Application-name sentinel used by backends for "no application".
pub const NO_APPLICATION: &str = "NA";

/// A normalised log event, built fresh by whichever source produced it.
///
/// Every source translates its native record into this shape at the adapter
/// boundary. Fields a source cannot supply are left empty (or `None`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Tenant the event belongs to.
    pub tenant_id: String,
    /// Server key of the service instance that emitted the event.
    pub server_name: String,
    /// Application name. `None` when the source reported no application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    /// Event time as written by the source, in the configured fixed format.
    pub log_time: String,
    /// Originating component (logger / target) name.
    pub logger: String,
    /// Severity, e.g. `ERROR`. Compared case-sensitively.
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    pub ip: String,
    pub instance: String,
    /// Backend row key, when the source has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl LogEvent {
    /// Normalise a raw application name: the `"NA"` sentinel and the empty
    /// string both mean "no application".
    pub fn normalize_app_name(raw: &str) -> Option<String> {
        if raw.is_empty() || raw == NO_APPLICATION {
            None
        } else {
            Some(raw.to_string())
        }
    }
}

/// The read constraints of a query: tenant, server key and application name.
///
/// An empty string passed to any constructor is exactly "unconstrained" and is
/// stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryScope {
    pub tenant: Option<String>,
    pub server_key: Option<String>,
    pub app_name: Option<String>,
}

impl QueryScope {
    pub fn new(tenant: &str, server_key: &str) -> Self {
        Self {
            tenant: non_empty(tenant),
            server_key: non_empty(server_key),
            app_name: None,
        }
    }

    /// A scope with no constraint at all.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn with_application(mut self, app_name: &str) -> Self {
        self.app_name = non_empty(app_name);
        self
    }

    pub fn without_application(mut self) -> Self {
        self.app_name = None;
        self
    }

    /// Whether a record with the given identity falls inside this scope.
    ///
    /// Tenant, server and application are compared exactly. A scope asking
    /// for an application never admits a record without one.
    pub fn admits(&self, tenant: &str, server_key: &str, app_name: Option<&str>) -> bool {
        if let Some(t) = &self.tenant {
            if t != tenant {
                return false;
            }
        }
        if let Some(s) = &self.server_key {
            if s != server_key {
                return false;
            }
        }
        match &self.app_name {
            Some(a) => app_name == Some(a.as_str()),
            None => true,
        }
    }

    /// [`admits`](Self::admits) applied to an already-built event.
    pub fn admits_event(&self, event: &LogEvent) -> bool {
        self.admits(&event.tenant_id, &event.server_name, event.app_name.as_deref())
    }
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Metadata of one log file held by a file source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFileInfo {
    pub name: String,
    /// Rotation date suffix of the file, or [`LogFileInfo::CURRENT`] for the
    /// live file.
    pub date: String,
    pub size_bytes: u64,
}

impl LogFileInfo {
    pub const CURRENT: &'static str = "current";

    /// Human-readable size: `"512 B"`, `"1.5 KB"`, `"3.0 MB"`, …
    pub fn human_size(&self) -> String {
        human_size(self.size_bytes)
    }
}

/// Format a byte count with a binary (1024) unit prefix and one decimal.
pub fn human_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let exp = ((bytes as f64).ln() / (UNIT as f64).ln()) as i32;
    let exp = exp.clamp(1, 6);
    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][(exp - 1) as usize];
    format!("{:.1} {prefix}B", bytes as f64 / (UNIT as f64).powi(exp))
}
