//! Receipt upload and watcher tests.

use super::harness::{ok, refused, wait_until, TestHarness};
use crate::outbound::{run_event_loop, upload, UploadOutcome};
use crate::presenter::{TipCategory, TipLevel};
use crate::remote::RECEIPT_PATH;
use crate::state::CounterSnapshot;
use crate::SyncError;
use notify::event::{CreateKind, DataChange, ModifyKind};
use notify::{Event, EventKind};
use relay_config_and_utils::xml_to_json;
use serde_json::json;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const HOUR: Duration = Duration::from_secs(3600);
const RECEIPT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CEB312Message guid="4CDE1CFD" version="1.0">
  <OrderReturn>
    <orderNo>BN12345</orderNo>
    <returnStatus>2</returnStatus>
  </OrderReturn>
</CEB312Message>"#;

#[tokio::test]
async fn receipt_file_is_uploaded_as_json() {
    let harness = TestHarness::new();
    let engine = harness.engine(HOUR);
    harness.transport.always(RECEIPT_PATH, ok(json!(null)));
    let path = harness.make_inbox("ACME").join("receipt_BN12345(x).xml");
    std::fs::write(&path, RECEIPT_XML).unwrap();

    let outcome = upload(&engine.context(), &path).await.unwrap();
    assert_eq!(outcome, UploadOutcome::Uploaded);

    let receipts = harness.transport.requests_to(RECEIPT_PATH);
    assert_eq!(receipts.len(), 1);
    let receipt = &receipts[0];
    assert_eq!(receipt.form("ecid"), Some("E1"));
    assert_eq!(receipt.form("admin_id"), Some("100"));
    assert_eq!(receipt.form("action"), Some("receipt"));
    assert_eq!(receipt.form("id"), Some("0"));
    assert_eq!(receipt.form("original_bn"), Some("BN12345"));
    assert_eq!(receipt.form("file"), Some("receipt_BN12345(x).xml"));

    let expected = xml_to_json(RECEIPT_XML.as_bytes()).unwrap();
    assert_eq!(receipt.form("content"), Some(expected.as_str()));
    let content: serde_json::Value = serde_json::from_str(&expected).unwrap();
    assert_eq!(content["CEB312Message"]["OrderReturn"]["orderNo"], "BN12345");
    assert_eq!(content["CEB312Message"]["-guid"], "4CDE1CFD");
}

#[tokio::test]
async fn status_file_reports_command_id() {
    let harness = TestHarness::new();
    let engine = harness.engine(HOUR);
    harness.transport.always(RECEIPT_PATH, ok(json!(null)));
    let path = harness
        .make_inbox("ACME")
        .join("successed_20240101.987(done).xml");
    std::fs::write(&path, "<Status>ok</Status>").unwrap();

    upload(&engine.context(), &path).await.unwrap();

    let receipt = &harness.transport.requests_to(RECEIPT_PATH)[0];
    assert_eq!(receipt.form("action"), Some("status"));
    assert_eq!(receipt.form("id"), Some("987"));
    assert_eq!(receipt.form("content"), Some(r#"{"Status":"ok"}"#));
}

#[tokio::test]
async fn non_xml_files_are_skipped() {
    let harness = TestHarness::new();
    let engine = harness.engine(HOUR);
    let path = harness.make_inbox("ACME").join("receipt_BN1.tmp");
    std::fs::write(&path, "<a/>").unwrap();

    let outcome = upload(&engine.context(), &path).await.unwrap();
    assert_eq!(outcome, UploadOutcome::Skipped);
    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn malformed_name_is_not_uploaded() {
    let harness = TestHarness::new();
    let engine = harness.engine(HOUR);
    let path = harness.make_inbox("ACME").join("failed_nodot.xml");
    std::fs::write(&path, "<a/>").unwrap();

    let err = upload(&engine.context(), &path).await.unwrap_err();
    assert!(matches!(err, SyncError::MalformedFilename(_)));
    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn invalid_xml_is_not_uploaded() {
    let harness = TestHarness::new();
    let engine = harness.engine(HOUR);
    let path = harness.make_inbox("ACME").join("receipt_BN1.xml");
    std::fs::write(&path, "<open><unclosed></open>").unwrap();

    let err = upload(&engine.context(), &path).await.unwrap_err();
    assert!(matches!(err, SyncError::Core(_)));
    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn refused_receipt_is_an_error() {
    let harness = TestHarness::new();
    let engine = harness.engine(HOUR);
    harness.transport.always(RECEIPT_PATH, refused("unknown enterprise"));
    let path = harness.make_inbox("ACME").join("notice.xml");
    std::fs::write(&path, "<a/>").unwrap();

    let err = upload(&engine.context(), &path).await.unwrap_err();
    assert!(matches!(err, SyncError::Remote(ref msg) if msg == "unknown enterprise"));
}

#[tokio::test]
async fn watcher_uploads_new_receipts() {
    let harness = TestHarness::new();
    harness.transport.always(RECEIPT_PATH, ok(json!(null)));
    let inbox = harness.make_inbox("ACME");
    let engine = harness.engine(HOUR);

    assert!(engine.start().await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    // Written elsewhere and moved in, so the watcher never sees a partial file.
    let staged = harness.data_path().join("receipt_BN777.xml");
    std::fs::write(&staged, "<R><No>BN777</No></R>").unwrap();
    std::fs::rename(&staged, inbox.join("receipt_BN777.xml")).unwrap();

    let uploaded = wait_until(Duration::from_secs(5), || engine.counters().uploads >= 1).await;
    assert!(engine.stop().await);
    assert!(uploaded, "receipt was not uploaded");

    let receipts = harness.transport.requests_to(RECEIPT_PATH);
    assert!(!receipts.is_empty());
    assert!(receipts
        .iter()
        .all(|r| r.form("original_bn") == Some("BN777")));
    assert_eq!(engine.counters().errors, 0);
}

#[tokio::test]
async fn watcher_without_targets_warns_and_exits() {
    let harness = TestHarness::new();
    std::fs::create_dir_all(harness.data_path().join("ACME").join("OutBox")).unwrap();
    let engine = harness.engine(HOUR);

    assert!(engine.start().await);
    let warned = wait_until(Duration::from_secs(5), || {
        harness
            .presenter
            .tips()
            .iter()
            .any(|(c, l, _)| *c == TipCategory::Error && *l == TipLevel::Critical)
    })
    .await;
    assert!(warned);

    let stopped = tokio::time::timeout(Duration::from_secs(5), engine.stop()).await;
    assert_eq!(stopped.ok(), Some(true));
}

#[tokio::test]
async fn watcher_error_is_reported_without_counting() {
    let harness = TestHarness::new();
    let engine = harness.engine(HOUR);
    let (tx, rx) = mpsc::unbounded_channel();
    let (_shutdown_tx, shutdown_rx) = oneshot::channel();
    tx.send(Err(notify::Error::generic("inotify queue overflow")))
        .unwrap();
    drop(tx);

    run_event_loop(&engine.context(), rx, shutdown_rx)
        .await
        .unwrap();

    let tips = harness.presenter.tips();
    assert_eq!(tips.len(), 1);
    assert_eq!(tips[0].0, TipCategory::Warning);
    assert_eq!(tips[0].1, TipLevel::Error);
    assert!(tips[0].2.contains("inotify queue overflow"));
    assert_eq!(engine.counters(), CounterSnapshot::default());
    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn create_and_modify_in_one_batch_upload_once() {
    let harness = TestHarness::new();
    let engine = harness.engine(HOUR);
    harness.transport.always(RECEIPT_PATH, ok(json!(null)));
    let path = harness.make_inbox("ACME").join("receipt_BN888.xml");
    std::fs::write(&path, "<R><No>BN888</No></R>").unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let (_shutdown_tx, shutdown_rx) = oneshot::channel();
    tx.send(Ok(Event::new(EventKind::Create(CreateKind::File)).add_path(path.clone())))
        .unwrap();
    tx.send(Ok(
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path.clone()),
    ))
    .unwrap();
    drop(tx);

    run_event_loop(&engine.context(), rx, shutdown_rx)
        .await
        .unwrap();

    assert_eq!(harness.transport.requests_to(RECEIPT_PATH).len(), 1);
    assert_eq!(engine.counters().uploads, 1);
    assert_eq!(engine.counters().errors, 0);
}

#[tokio::test]
async fn event_loop_ends_on_shutdown() {
    let harness = TestHarness::new();
    let engine = harness.engine(HOUR);
    let (_tx, rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    shutdown_tx.send(()).unwrap();

    let err = run_event_loop(&engine.context(), rx, shutdown_rx)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::WatcherStopped));
}
