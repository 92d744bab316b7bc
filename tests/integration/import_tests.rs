//! Integration tests for local mailbox import

use archive_weaver::config::{Config, OutputConfig};
use archive_weaver::crawler::parse_message_page;
use archive_weaver::mbox::{import_mbox_directory, parse_directory};
use archive_weaver::storage::{JsonlRecordStore, RecordLog};
use archive_weaver::ArchiveError;
use std::path::Path;
use tempfile::TempDir;

const JANUARY: &str = "From alice@example.com Mon Jan  6 10:00:00 2025
From: Alice <alice@example.com>
Subject: Contracts
Date: Mon, 6 Jan 2025 10:00:00 +0000
Message-ID: <contracts@example.com>

hello
> quoted
On Jan 1, Alice wrote:
world

From bob@example.com Tue Jan  7 11:00:00 2025
From: Bob <bob@example.com>
Subject: Re: Contracts
Date: Tue, 7 Jan 2025 11:00:00 +0000
Message-ID: <contracts-reply@example.com>
In-Reply-To: <contracts@example.com>

Agreed.
";

fn create_test_config(dir: &Path) -> Config {
    Config {
        output: OutputConfig {
            records_path: dir.join("out/emails.jsonl").display().to_string(),
            state_path: dir.join("out/crawl_state.json").display().to_string(),
        },
        ..Config::default()
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[test]
fn test_import_writes_threaded_records() {
    let workspace = TempDir::new().unwrap();
    let mailboxes = workspace.path().join("mailboxes");
    std::fs::create_dir(&mailboxes).unwrap();
    std::fs::write(mailboxes.join("std-proposals-2025-01.mbox"), JANUARY).unwrap();

    let config = create_test_config(workspace.path());
    let summary = import_mbox_directory(&config, &mailboxes).unwrap();

    assert_eq!(summary.messages_written, 2);
    assert_eq!(summary.records, 2);
    assert_eq!(summary.threads, 1);
    assert_eq!(summary.errors, 0);

    let records = JsonlRecordStore::new(&config.output.records_path)
        .read_all()
        .unwrap();
    let reply = records
        .iter()
        .find(|r| r.message_id == "<contracts-reply@example.com>")
        .unwrap();
    assert_eq!(reply.thread_root_id.as_deref(), Some("<contracts@example.com>"));
    assert_eq!(reply.thread_depth, 1);
    assert_eq!(reply.period, "2025/01");
    assert_eq!(
        reply.source_url,
        "https://lists.isocpp.org/std-proposals/2025/01/"
    );
}

#[test]
fn test_reimport_keeps_one_copy_of_each_message() {
    let workspace = TempDir::new().unwrap();
    let mailboxes = workspace.path().join("mailboxes");
    std::fs::create_dir(&mailboxes).unwrap();
    std::fs::write(mailboxes.join("2025_01.mbox"), JANUARY).unwrap();

    let config = create_test_config(workspace.path());
    import_mbox_directory(&config, &mailboxes).unwrap();
    let summary = import_mbox_directory(&config, &mailboxes).unwrap();

    assert_eq!(summary.messages_written, 2);
    assert_eq!(summary.duplicates_dropped, 2);
    assert_eq!(summary.records, 2);

    let records = JsonlRecordStore::new(&config.output.records_path)
        .read_all()
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn test_mailbox_and_page_strip_bodies_identically() {
    let workspace = TempDir::new().unwrap();
    std::fs::write(workspace.path().join("2025-01.mbox"), JANUARY).unwrap();

    let from_mailbox = parse_directory(workspace.path(), "https://lists.example.org/list")
        .unwrap()
        .into_iter()
        .find(|r| r.message_id == "<contracts@example.com>")
        .unwrap();

    // The blank separator line before the next message stays in the raw body
    assert_eq!(
        from_mailbox.body_clean.trim_end(),
        "hello\nOn Jan 1, Alice wrote:\nworld"
    );
    assert_eq!(from_mailbox.body_new_content, "hello\nworld");

    let page = format!(
        r#"<html><body><h1>list</h1><h1>Contracts</h1>
<!-- id="<contracts@example.com>" -->
<pre>{}</pre></body></html>"#,
        html_escape(&from_mailbox.body_raw)
    );
    let from_page = parse_message_page(
        &page,
        "https://lists.example.org/list/2025/01/0001.php",
        "2025/01",
        "list",
    )
    .unwrap();

    assert_eq!(from_page.body_raw, from_mailbox.body_raw);
    assert_eq!(from_page.body_clean, from_mailbox.body_clean);
    assert_eq!(from_page.body_new_content, from_mailbox.body_new_content);
}

#[test]
fn test_import_requires_a_directory() {
    let workspace = TempDir::new().unwrap();
    let file = workspace.path().join("2025-01.mbox");
    std::fs::write(&file, JANUARY).unwrap();
    let config = create_test_config(workspace.path());

    let result = import_mbox_directory(&config, &file);
    assert!(matches!(result, Err(ArchiveError::NotADirectory { .. })));

    let missing = workspace.path().join("does-not-exist");
    let result = import_mbox_directory(&config, &missing);
    assert!(matches!(result, Err(ArchiveError::NotADirectory { .. })));

    assert!(!Path::new(&config.output.records_path).exists());
}
