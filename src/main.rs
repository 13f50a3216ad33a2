use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use lav::sources::{BufferLayer, RingBuffer};
use lav::{Config, LogEvent, LogFileInfo, Page, QueryScope, SourceContext};

/// Records kept in memory for the `memory` event source.
const CAPTURE_CAPACITY: usize = 10_000;

#[derive(Parser)]
#[command(name = "lav", about = "Log Aggregation Viewer: query tenant-scoped log events")]
struct Cli {
    /// Config file to load instead of ~/.config/lav/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(long, global = true)]
    debug: bool,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct ScopeArgs {
    /// Tenant to read; empty uses the configured default.
    #[arg(long, default_value = "")]
    tenant: String,

    /// Server key to read; empty uses the configured default.
    #[arg(long, default_value = "")]
    server: String,
}

impl ScopeArgs {
    fn scope(&self) -> QueryScope {
        QueryScope::new(&self.tenant, &self.server)
    }
}

#[derive(Subcommand)]
enum Command {
    /// List events, newest first.
    Events {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Exact severity, or ALL.
        #[arg(long, default_value = "")]
        severity: String,
        /// Case-insensitive substring of message, logger or stack trace.
        #[arg(long, default_value = "")]
        keyword: String,
        /// Restrict to one application.
        #[arg(long)]
        app: Option<String>,
        /// Show one page instead of everything.
        #[arg(long)]
        page: Option<usize>,
        /// Every event the source holds, ignoring scope and filters.
        #[arg(long)]
        system: bool,
    },
    /// List distinct application names.
    Apps {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Count events in scope.
    Count {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// List log files.
    Files {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        page: Option<usize>,
    },
    /// Print lines of one log file.
    Show {
        #[command(flatten)]
        scope: ScopeArgs,
        file: String,
        /// First line, zero-based.
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// One past the last line; defaults to start + max.
        #[arg(long)]
        end: Option<usize>,
        #[arg(long, default_value_t = 100)]
        max: usize,
        /// Print the line count only.
        #[arg(long)]
        count: bool,
        /// Write the whole file to stdout unchanged.
        #[arg(long)]
        raw: bool,
    },
    /// Drop every event held by the source.
    Clear,
}

fn init_tracing(debug: bool, buffer: &RingBuffer) {
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(BufferLayer::new(buffer.clone(), "", "lav"))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let buffer = RingBuffer::new(CAPTURE_CAPACITY);
    init_tracing(cli.debug, &buffer);

    let config = match &cli.config {
        Some(path) => Config::load_from(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::load().context("loading default config")?,
    };
    let ctx = SourceContext::default().with_buffer(buffer);
    let viewer = lav::build_viewer(&config, &ctx).context("building log viewer")?;
    let out = Output { json: cli.json };

    match cli.command {
        Command::Events { scope, severity, keyword, app, page, system } => {
            if system {
                out.events(&viewer.system_events().await?)?;
                return Ok(());
            }
            let scope = scope.scope();
            let app = app.unwrap_or_default();
            match page {
                Some(n) => {
                    let page = viewer.get_application_page(n, &severity, &keyword, &app, &scope).await?;
                    out.event_page(page.as_ref())?;
                }
                None => {
                    let events = viewer.list_application_logs(&severity, &keyword, &app, &scope).await?;
                    out.events(&events)?;
                }
            }
        }
        Command::Apps { scope } => {
            let names = viewer.list_application_names(&scope.scope()).await?;
            out.lines(&names)?;
        }
        Command::Count { scope } => {
            let count = viewer.count_events(&scope.scope()).await?;
            out.value(&count)?;
        }
        Command::Files { scope, page } => {
            let scope = scope.scope();
            match page {
                Some(n) => {
                    let page = viewer.get_log_file_page(n, &scope).await?;
                    out.file_page(page.as_ref())?;
                }
                None => out.files(&viewer.list_log_files(&scope).await?)?,
            }
        }
        Command::Show { scope, file, start, end, max, count, raw } => {
            let scope = scope.scope();
            if raw {
                let bytes = viewer.download_log_file(&file, &scope).await?;
                std::io::stdout().write_all(&bytes)?;
            } else if count {
                out.value(&viewer.log_line_count(&file, &scope).await?)?;
            } else {
                let end = end.unwrap_or_else(|| start.saturating_add(max));
                out.lines(&viewer.log_lines(&file, start, end, max, &scope).await?)?;
            }
        }
        Command::Clear => {
            let cleared = viewer.clear_events().await;
            if !cleared {
                anyhow::bail!("event source does not support clearing");
            }
            out.value(&cleared)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

struct Output {
    json: bool,
}

impl Output {
    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn value<T: Serialize + std::fmt::Display>(&self, value: &T) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(value);
        }
        println!("{value}");
        Ok(())
    }

    fn lines(&self, lines: &[String]) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(lines);
        }
        for line in lines {
            println!("{line}");
        }
        Ok(())
    }

    fn events(&self, events: &[LogEvent]) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(events);
        }
        for event in events {
            println!(
                "{} {:<5} [{}] {{{}}} - {}",
                event.log_time,
                event.severity,
                event.app_name.as_deref().unwrap_or("-"),
                event.logger,
                event.message
            );
            if let Some(trace) = &event.stack_trace {
                print!("{trace}");
            }
        }
        Ok(())
    }

    fn event_page(&self, page: Option<&Page<LogEvent>>) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(&page);
        }
        match page {
            Some(page) => {
                println!("page {} of {}", page.page_number, page.total_pages);
                self.events(&page.items)
            }
            None => {
                println!("no matching events");
                Ok(())
            }
        }
    }

    fn files(&self, files: &[LogFileInfo]) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(files);
        }
        for file in files {
            println!("{:<40} {:<12} {:>10}", file.name, file.date, file.human_size());
        }
        Ok(())
    }

    fn file_page(&self, page: Option<&Page<LogFileInfo>>) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(&page);
        }
        match page {
            Some(page) => {
                println!("page {} of {}", page.page_number, page.total_pages);
                self.files(&page.items)
            }
            None => {
                println!("no log files");
                Ok(())
            }
        }
    }
}
