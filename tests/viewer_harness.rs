#![allow(unused)]
//! Viewer (facade) integration harness.
//!
//! # What this covers
//!
//! - **Pipeline**: scope → fetch → filter → sort → paginate through
//!   `LogViewer` over a static source.
//! - **Scenarios**: three events INFO/ERROR/ERROR filtered to ERROR come back
//!   newest first; 25 events in pages of 10; an empty store gives an empty
//!   list and no page.
//! - **Application scope**: application queries and the application listing
//!   with the hidden-name denylist.
//! - **Failures**: an unreachable source surfaces as `SourceUnavailable`, never
//!   as an empty or placeholder result.
//! - **Config wiring**: `build_viewer` from a TOML config; a timestamp format
//!   chrono cannot use is rejected before any source is built.
//!
//! # Running
//!
//! ```sh
//! cargo test --test viewer_harness
//! ```

mod common;
use common::*;

use std::sync::Arc;

use lav::{build_viewer, Config, LogViewer, QueryScope, SourceContext, ViewerError, ViewerSettings};
use pretty_assertions::assert_eq;

fn all() -> QueryScope {
    QueryScope::unconstrained()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn error_filter_returns_newest_errors_first() {
    let viewer = viewer_over(
        vec![
            EventBuilder::new("t1").severity("INFO").at_second(1).build(),
            EventBuilder::new("t2").severity("ERROR").at_second(2).build(),
            EventBuilder::new("t3").severity("ERROR").at_second(3).build(),
        ],
        15,
    );
    let events = viewer.list_events("ERROR", "", &all()).await.unwrap();
    assert_messages!(events, ["t3", "t2"]);
}

#[tokio::test]
async fn twenty_five_events_page_of_ten() {
    let viewer = viewer_over(numbered_events(25), 10);

    let third = viewer.get_page(3, "", "", &all()).await.unwrap();
    assert_page!(third, number = 3, of = 3, items = 5);
    assert_messages!(third.unwrap().items, ["event 4", "event 3", "event 2", "event 1", "event 0"]);

    let clamped = viewer.get_page(5, "", "", &all()).await.unwrap();
    assert_page!(clamped, number = 3, of = 3, items = 5);

    let first = viewer.get_page(1, "", "", &all()).await.unwrap().unwrap();
    assert_eq!(first.items[0].message, "event 24");
}

#[tokio::test]
async fn empty_store_is_empty_not_an_error() {
    let viewer = viewer_over(Vec::new(), 10);
    assert!(viewer.list_events("", "", &all()).await.unwrap().is_empty());
    assert!(viewer.list_events("ERROR", "boom", &all()).await.unwrap().is_empty());
    assert!(viewer.get_page(1, "", "", &all()).await.unwrap().is_none());
    assert!(viewer.list_application_names(&all()).await.unwrap().is_empty());
    assert_eq!(viewer.count_events(&all()).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

fn multi_tenant() -> LogViewer {
    viewer_over(
        vec![
            EventBuilder::new("shop 1").tenant("1").app("shop").at_second(1).build(),
            EventBuilder::new("billing 1").tenant("1").app("billing").severity("ERROR").at_second(2).build(),
            EventBuilder::new("root 1").tenant("1").app("STRATOS_ROOT").at_second(3).build(),
            EventBuilder::new("none 1").tenant("1").app("NA").at_second(4).build(),
            EventBuilder::new("Admin 1").tenant("1").app("Admin").at_second(5).build(),
            EventBuilder::new("shop 2").tenant("2").app("shop").at_second(6).build(),
            EventBuilder::new("esb 1").tenant("1").server("ESB").app("proxy").at_second(7).build(),
        ],
        15,
    )
}

#[tokio::test]
async fn tenant_and_server_scope_restrict_events() {
    let viewer = multi_tenant();
    let tenant_one = viewer.list_events("", "", &QueryScope::new("1", "AS")).await.unwrap();
    assert_messages!(tenant_one, ["Admin 1", "none 1", "root 1", "billing 1", "shop 1"]);

    let every_server = viewer.list_events("", "", &QueryScope::new("1", "")).await.unwrap();
    assert_eq!(every_server.len(), 6);
}

#[tokio::test]
async fn application_logs_and_pages() {
    let viewer = multi_tenant();
    let scope = QueryScope::new("1", "AS");

    let shop = viewer.list_application_logs("", "", "shop", &scope).await.unwrap();
    assert_messages!(shop, ["shop 1"]);

    let billing_errors = viewer.list_application_logs("ERROR", "", "billing", &scope).await.unwrap();
    assert_messages!(billing_errors, ["billing 1"]);

    let page = viewer.get_application_page(1, "", "", "billing", &scope).await.unwrap();
    assert_page!(page, number = 1, of = 1, items = 1);

    assert!(viewer.get_application_page(1, "", "", "missing", &scope).await.unwrap().is_none());
}

#[tokio::test]
async fn application_listing_hides_sentinels_and_admin_apps() {
    let viewer = multi_tenant();
    let names = viewer.list_application_names(&QueryScope::new("1", "AS")).await.unwrap();
    assert_eq!(names, vec!["Admin", "billing", "shop"]);
}

#[tokio::test]
async fn default_scope_comes_from_settings() {
    let settings = ViewerSettings {
        default_tenant: "2".to_string(),
        default_server_key: "AS".to_string(),
        ..settings(15)
    };
    let source = StaticSource::new(vec![
        EventBuilder::new("one").tenant("1").build(),
        EventBuilder::new("two").tenant("2").build(),
    ]);
    let viewer = LogViewer::new(Arc::new(source), settings);
    assert_messages!(viewer.list_events("", "", &all()).await.unwrap(), ["two"]);
    assert_eq!(viewer.count_events(&all()).await.unwrap(), 1);
}

#[tokio::test]
async fn system_events_ignore_scope() {
    let viewer = multi_tenant();
    let events = viewer.system_events().await.unwrap();
    assert_eq!(events.len(), 7);
    assert_newest_first!(events);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_source_is_an_error() {
    let viewer = LogViewer::new(Arc::new(DownSource), settings(10));
    let err = viewer.list_events("", "", &all()).await.unwrap_err();
    assert!(matches!(err, ViewerError::SourceUnavailable { ref backend, .. } if backend == "down"));
    assert!(viewer.get_page(1, "", "", &all()).await.is_err());
    assert!(viewer.list_application_names(&all()).await.is_err());
    assert!(viewer.count_events(&all()).await.is_err());
}

#[tokio::test]
async fn offloaded_sort_gives_the_same_order() {
    let events = numbered_events(40);
    let inline = viewer_over(events.clone(), 10);
    let offloaded = LogViewer::new(
        Arc::new(StaticSource::new(events)),
        ViewerSettings { offload_sort: true, ..settings(10) },
    );
    assert_eq!(
        offloaded.list_events("", "", &all()).await.unwrap(),
        inline.list_events("", "", &all()).await.unwrap()
    );
}

// ---------------------------------------------------------------------------
// Config wiring
// ---------------------------------------------------------------------------

#[tokio::test]
async fn viewer_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    std::fs::create_dir(&logs).unwrap();
    write_log_dir(&logs);

    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[viewer]
page_size = 2
default_tenant = "0"

[event_source]
kind = "file"
[event_source.properties]
directory = "{dir}"

[file_source]
kind = "file"
[file_source.properties]
directory = "{dir}"
"#,
            dir = logs.display()
        ),
    )
    .unwrap();

    let config = Config::load_from(&config_path).unwrap();
    assert_eq!(config.viewer.page_size, 2);
    let viewer = build_viewer(&config, &SourceContext::default()).unwrap();

    let errors = viewer.list_events("ERROR", "", &all()).await.unwrap();
    assert_messages!(errors, ["invoice rejected", "checkout failed"]);

    let page = viewer.get_page(1, "", "", &all()).await.unwrap();
    assert_page!(page, number = 1, of = 3, items = 2);

    let files = viewer.list_log_files(&all()).await.unwrap();
    assert_eq!(files.len(), 2);
}

#[test]
fn unknown_provider_fails_to_build() {
    let mut config = Config::defaults();
    config.event_source.kind = "cassandra".to_string();
    let err = build_viewer(&config, &SourceContext::default()).unwrap_err();
    assert!(err.is_unavailable());
}

#[test]
fn unusable_timestamp_format_fails_to_build() {
    let mut config = Config::defaults();
    config.viewer.timestamp_format = "%Y-%Q".to_string();
    config.event_source.kind = "memory".to_string();
    let ctx = SourceContext::default().with_buffer(lav::sources::RingBuffer::new(8));
    let err = build_viewer(&config, &ctx).unwrap_err();
    assert!(matches!(err, ViewerError::Config(_)));
}

#[test]
fn unusable_timestamp_format_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[viewer]\ntimestamp_format = \"%Y-%Q\"\n").unwrap();
    assert!(matches!(Config::load_from(&config_path), Err(ViewerError::Config(_))));
}
