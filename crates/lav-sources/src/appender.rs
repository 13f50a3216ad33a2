//! [`BufferLayer`] is a `tracing_subscriber::Layer` that captures every
//! `tracing` event of the host process into a [`RingBuffer`], where the
//! memory source can query it.
//!
//! Events may carry `tenant`, `app`, `ip` and `stack_trace` fields; missing
//! ones fall back to the layer's defaults.

use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::buffer::{BufferedRecord, RingBuffer};

// ── Visitor (extracts fields from tracing events) ───────────────────────────

#[derive(Default)]
struct RecordVisitor {
    message: String,
    tenant: Option<String>,
    app: Option<String>,
    ip: Option<String>,
    stack_trace: Option<String>,
    extra: Vec<String>,
}

impl RecordVisitor {
    fn store(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = value,
            "tenant" => self.tenant = Some(value),
            "app" => self.app = Some(value),
            "ip" => self.ip = Some(value),
            "stack_trace" => self.stack_trace = Some(value),
            other => self.extra.push(format!("{other}={value}")),
        }
    }
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.store(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }
}

// ── BufferLayer ─────────────────────────────────────────────────────────────

pub struct BufferLayer {
    buffer: RingBuffer,
    tenant_id: String,
    server_key: String,
    instance: String,
}

impl BufferLayer {
    /// Capture into `buffer`, stamping records with `tenant_id` and
    /// `server_key` unless the event names its own tenant.
    pub fn new(buffer: RingBuffer, tenant_id: impl Into<String>, server_key: impl Into<String>) -> Self {
        Self {
            buffer,
            tenant_id: tenant_id.into(),
            server_key: server_key.into(),
            instance: String::new(),
        }
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }
}

impl<S: tracing::Subscriber> Layer<S> for BufferLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let mut message = visitor.message;
        if !visitor.extra.is_empty() {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(&visitor.extra.join(" "));
        }

        self.buffer.push(BufferedRecord {
            tenant_id: visitor.tenant.unwrap_or_else(|| self.tenant_id.clone()),
            server_key: self.server_key.clone(),
            app_name: visitor.app.filter(|a| !a.is_empty()),
            logged_at: chrono::Utc::now().naive_utc(),
            level: meta.level().to_string(),
            logger: meta.target().to_string(),
            message,
            stack_trace: visitor
                .stack_trace
                .map(|trace| trace.lines().map(str::to_string).collect()),
            ip: visitor.ip.unwrap_or_default(),
            instance: self.instance.clone(),
        });
    }
}
