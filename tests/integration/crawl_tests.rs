//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small month-paginated archive and run
//! the full crawl cycle end-to-end against it.

use archive_weaver::config::{ArchiveConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use archive_weaver::crawler::{run_crawl, run_incremental, PeriodFilter};
use archive_weaver::storage::{CrawlStateStore, JsonlRecordStore, RecordLog};
use archive_weaver::{ArchiveError, MessageRecord, Period};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock archive
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    Config {
        archive: ArchiveConfig {
            base_url: format!("{}/std-proposals", server.uri()),
            start_year: 2024,
            start_month: 1,
            ..ArchiveConfig::default()
        },
        crawler: CrawlerConfig {
            max_concurrent_requests: 4,
            max_concurrent_periods: 2,
            request_timeout_secs: 5,
            max_retries: 2,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 5,
            crawl_delay_ms: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            ..UserAgentConfig::default()
        },
        output: OutputConfig {
            records_path: dir.path().join("emails.jsonl").display().to_string(),
            state_path: dir.path().join("crawl_state.json").display().to_string(),
        },
    }
}

fn message_page(subject: &str, id: &str, parent: Option<&str>, body: &str) -> String {
    let parent = parent
        .map(|p| format!(r#"<!-- inreplyto="{}" -->"#, p))
        .unwrap_or_default();
    format!(
        r#"<html><head>
<!-- sent="Mon, 15 Jan 2024 10:00:00 +0000" -->
<!-- name="Test Author" -->
<!-- email="author_at_[hidden]" -->
<!-- id="{id}" -->
{parent}
</head><body>
<h1>std-proposals</h1>
<h1>{subject}</h1>
<div id="start">{body}</div>
</body></html>"#
    )
}

async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Two periods; the thread starts in January and continues in February
async fn mount_archive(server: &MockServer, robots: Option<&str>) {
    match robots {
        Some(body) => mount_page(server, "/robots.txt", 200, body.to_string()).await,
        None => mount_page(server, "/robots.txt", 404, String::new()).await,
    }

    mount_page(
        server,
        "/std-proposals/",
        200,
        r#"<html><body>
            <a href="2023/12/">December 2023</a>
            <a href="2024/01/">January 2024</a>
            <a href="2024/02/index.php">February 2024</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        server,
        "/std-proposals/2024/01/index.php",
        200,
        r#"<a href="0001.php">Root</a> <a href="0002.php">Reply</a>"#.to_string(),
    )
    .await;
    mount_page(
        server,
        "/std-proposals/2024/01/0001.php",
        200,
        message_page("Modules", "<root@example.org>", None, "Let's discuss modules."),
    )
    .await;
    mount_page(
        server,
        "/std-proposals/2024/01/0002.php",
        200,
        message_page(
            "Re: Modules",
            "<reply@example.org>",
            Some("<root@example.org>"),
            "Sounds good.",
        ),
    )
    .await;
}

async fn mount_february(server: &MockServer, index_status: u16) {
    mount_page(
        server,
        "/std-proposals/2024/02/index.php",
        index_status,
        r#"<a href="msg0001.html">Follow-up</a>"#.to_string(),
    )
    .await;
    mount_page(
        server,
        "/std-proposals/2024/02/msg0001.html",
        200,
        message_page(
            "Re: Re: Modules",
            "<followup@example.org>",
            Some("<reply@example.org>"),
            "One more thing.",
        ),
    )
    .await;
}

fn records_by_id(dir: &TempDir) -> Vec<MessageRecord> {
    let mut records = JsonlRecordStore::new(dir.path().join("emails.jsonl"))
        .read_all()
        .unwrap();
    records.sort_by(|a, b| a.message_id.cmp(&b.message_id));
    records
}

fn period(key: &str) -> Period {
    key.parse().unwrap()
}

#[tokio::test]
async fn test_full_crawl_reconstructs_threads_across_periods() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_archive(&server, None).await;
    mount_february(&server, 200).await;

    let summary = run_crawl(create_test_config(&server, &dir), PeriodFilter::default())
        .await
        .unwrap();

    assert_eq!(summary.periods_processed, 2);
    assert_eq!(summary.periods_failed, 0);
    assert_eq!(summary.messages_written, 3);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.records, 3);
    assert_eq!(summary.threads, 1);

    let records = records_by_id(&dir);
    let depths: Vec<(&str, u32)> = records
        .iter()
        .map(|r| (r.message_id.as_str(), r.thread_depth))
        .collect();
    assert_eq!(
        depths,
        vec![
            ("<followup@example.org>", 2),
            ("<reply@example.org>", 1),
            ("<root@example.org>", 0),
        ]
    );
    for record in &records {
        assert_eq!(record.thread_root_id.as_deref(), Some("<root@example.org>"));
    }

    let followup = &records[0];
    assert_eq!(followup.subject, "Re: Modules");
    assert_eq!(followup.period, "2024/02");
    assert_eq!(followup.body_new_content, "One more thing.");

    // December 2023 is before the configured start period
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.path().contains("/2023/12/")));

    let state = CrawlStateStore::new(dir.path().join("crawl_state.json"))
        .load()
        .unwrap();
    assert!(state.is_completed(&period("2024/01")));
    assert!(state.is_completed(&period("2024/02")));
}

#[tokio::test]
async fn test_completed_periods_are_never_refetched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_archive(&server, None).await;
    mount_february(&server, 200).await;

    std::fs::write(
        dir.path().join("crawl_state.json"),
        r#"{"completed_periods": ["2024/01"], "last_crawl": null}"#,
    )
    .unwrap();

    let summary = run_crawl(create_test_config(&server, &dir), PeriodFilter::default())
        .await
        .unwrap();

    assert_eq!(summary.periods_skipped, 1);
    assert_eq!(summary.periods_processed, 1);
    assert_eq!(summary.messages_written, 1);

    let requests = server.received_requests().await.unwrap();
    assert!(!requests.is_empty());
    assert!(requests.iter().all(|r| !r.url.path().contains("/2024/01")));
}

#[tokio::test]
async fn test_robots_disallow_aborts_before_any_fetch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_archive(&server, Some("User-agent: *\nDisallow: /std-proposals\n")).await;
    mount_february(&server, 200).await;

    let result = run_crawl(create_test_config(&server, &dir), PeriodFilter::default()).await;
    assert!(matches!(result, Err(ArchiveError::PolicyDenied { .. })));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() == "/robots.txt"));
    assert!(!dir.path().join("emails.jsonl").exists());
    assert!(!dir.path().join("crawl_state.json").exists());
}

#[tokio::test]
async fn test_failed_index_leaves_period_incomplete() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_archive(&server, None).await;
    mount_february(&server, 500).await;

    let summary = run_crawl(create_test_config(&server, &dir), PeriodFilter::default())
        .await
        .unwrap();

    assert_eq!(summary.periods_processed, 1);
    assert_eq!(summary.periods_failed, 1);
    assert_eq!(summary.messages_written, 2);
    assert!(summary.errors >= 1);

    let state = CrawlStateStore::new(dir.path().join("crawl_state.json"))
        .load()
        .unwrap();
    assert!(state.is_completed(&period("2024/01")));
    assert!(!state.is_completed(&period("2024/02")));
}

#[tokio::test]
async fn test_message_failure_does_not_fail_period() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_archive(&server, None).await;
    mount_page(
        &server,
        "/std-proposals/2024/02/index.php",
        200,
        r#"<a href="0001.php">Gone</a>"#.to_string(),
    )
    .await;
    mount_page(&server, "/std-proposals/2024/02/0001.php", 404, String::new()).await;

    let summary = run_crawl(create_test_config(&server, &dir), PeriodFilter::default())
        .await
        .unwrap();

    assert_eq!(summary.periods_processed, 2);
    assert_eq!(summary.periods_failed, 0);
    assert_eq!(summary.messages_written, 2);
    assert_eq!(summary.errors, 1);
}

#[tokio::test]
async fn test_only_filter_crawls_single_period() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_archive(&server, None).await;
    mount_february(&server, 200).await;

    let filter = PeriodFilter {
        only: Some(period("2024/02")),
        ..PeriodFilter::default()
    };
    let summary = run_crawl(create_test_config(&server, &dir), filter)
        .await
        .unwrap();

    assert_eq!(summary.periods_processed, 1);
    assert_eq!(summary.messages_written, 1);

    // The parent lives in an uncrawled period, so the follow-up is its own root
    let records = records_by_id(&dir);
    assert_eq!(records.len(), 1);
    assert!(records[0].is_thread_root());
}

#[tokio::test]
async fn test_incremental_resumes_after_latest_completed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_archive(&server, None).await;
    mount_february(&server, 200).await;

    let config = create_test_config(&server, &dir);
    let state_store = CrawlStateStore::new(&config.output.state_path);
    state_store.mark_completed(&period("2024/01")).unwrap();

    let summary = run_incremental(config).await.unwrap();

    assert_eq!(summary.periods_processed, 1);
    assert_eq!(summary.messages_written, 1);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.path().contains("/2024/01")));
    assert!(state_store.load().unwrap().is_completed(&period("2024/02")));
}

#[tokio::test]
async fn test_rerun_appends_nothing_new() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_archive(&server, None).await;
    mount_february(&server, 200).await;

    run_crawl(create_test_config(&server, &dir), PeriodFilter::default())
        .await
        .unwrap();
    let first = records_by_id(&dir);

    let summary = run_crawl(create_test_config(&server, &dir), PeriodFilter::default())
        .await
        .unwrap();

    assert_eq!(summary.periods_skipped, 2);
    assert_eq!(summary.messages_written, 0);
    assert_eq!(records_by_id(&dir), first);
}
