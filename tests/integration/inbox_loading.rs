//! Inbox loading and archiving

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use tempfile::TempDir;

use engagement_collector::source::{IdentifierSource, InboxSource};

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_mixed_inbox_is_loaded_deduplicated_and_archived() {
    let inbox = TempDir::new().unwrap();
    let dir = inbox.path();

    fs::write(
        dir.join("a_search.json"),
        r#"{"results":[{"id":"tag:search.twitter.com,2005:100"},{"id":"tag:search.twitter.com,2005:101"}]}"#,
    )
    .unwrap();
    fs::write(
        dir.join("b_replay.json.gz"),
        gzip("{\"id\":\"tag:search.twitter.com,2005:101\"}\n{\"id\":\"tag:search.twitter.com,2005:102\"}\n{\"info\":{\"message\":\"Replay Request Completed\"}}\n"),
    )
    .unwrap();
    fs::write(dir.join("c_ids.csv"), "tweet_id\n103\n100\n").unwrap();
    fs::write(dir.join("d_users.csv"), "user_id\n555\n").unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let mut source = InboxSource::new(dir);
    let ids = source.load_identifiers().unwrap();

    assert_eq!(ids.as_slice(), &[100, 101, 102, 103]);

    let processed = source.processed_dir();
    assert!(processed.join("a_search.json").exists());
    assert!(processed.join("b_replay.json.gz").exists());
    assert!(processed.join("c_ids.csv").exists());
    assert!(dir.join("d_users.csv").exists(), "CSV without tweet_id stays in the inbox");
    assert!(dir.join("notes.txt").exists());
    assert!(!dir.join("a_search.json").exists());
}

#[test]
fn test_second_load_finds_nothing() {
    let inbox = TempDir::new().unwrap();
    fs::write(inbox.path().join("tweets.json"), r#"[{"id":1},{"id":2}]"#).unwrap();

    let mut source = InboxSource::new(inbox.path());
    assert_eq!(source.load_identifiers().unwrap().len(), 2);
    assert!(!source.has_files().unwrap());
    assert!(source.load_identifiers().unwrap().is_empty());
}

#[test]
fn test_unparseable_file_is_left_in_place() {
    let inbox = TempDir::new().unwrap();
    fs::write(inbox.path().join("broken.json"), "{\"id\":1}\n{not json").unwrap();
    fs::write(inbox.path().join("good.json"), r#"{"statuses":[{"id_str":"9"}]}"#).unwrap();

    let mut source = InboxSource::new(inbox.path());
    let ids = source.load_identifiers().unwrap();

    assert_eq!(ids.as_slice(), &[9]);
    assert!(inbox.path().join("broken.json").exists());
}

#[test]
fn test_missing_inbox_is_empty() {
    let inbox = TempDir::new().unwrap();
    let mut source = InboxSource::new(inbox.path().join("absent"));
    assert!(source.load_identifiers().unwrap().is_empty());
}

#[test]
fn test_failed_archive_keeps_loading_and_leaves_file() {
    let inbox = TempDir::new().unwrap();
    let dir = inbox.path();
    fs::write(dir.join("a.csv"), "tweet_id\n1\n").unwrap();
    fs::write(dir.join("b.csv"), "tweet_id\n2\n").unwrap();
    // A non-empty directory at the target blocks the rename
    fs::create_dir_all(dir.join("processed/b.csv/x")).unwrap();

    let mut source = InboxSource::new(dir);
    let ids = source.load_identifiers().unwrap();

    assert_eq!(ids.as_slice(), &[1, 2]);
    assert!(dir.join("processed/a.csv").is_file());
    assert!(!dir.join("a.csv").exists());
    assert!(dir.join("b.csv").is_file());
}
