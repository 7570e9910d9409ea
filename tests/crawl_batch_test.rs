mod common;

use std::sync::Arc;
use std::time::Duration;

use arxiv_review_crawler::error::{AppError, UploadError};
use arxiv_review_crawler::services::{BelowThresholdPolicy, DedupLedger, GatePolicy, UnratedPolicy};
use common::*;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

fn ledger_in(dir: &tempfile::TempDir) -> DedupLedger {
    DedupLedger::open(dir.path().join("processed_papers.json")).unwrap()
}

#[tokio::test]
async fn test_batch_uploads_and_records_every_paper() {
    let dir = tempfile::tempdir().unwrap();
    let completion = ScriptedCompletion::always_ok();
    let uploader = RecordingUploader::new();
    let processor = processor(
        completion.clone(),
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(StaticSource::new(papers(3)), processor, ledger_in(&dir), Duration::ZERO);

    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(stats.fetched, 3);
    assert_eq!(stats.uploaded, 3);
    assert_eq!(stats.uploaded_with_review, 3);
    assert_eq!(stats.recorded, 3);
    // 每篇：初始 + 1 轮反思 + 集成
    assert_eq!(completion.call_count(), 9);

    let uploads = uploader.uploads();
    assert!(uploads.iter().all(|u| u.has_pdf));
    assert_eq!(uploads[0].review.as_ref().unwrap()["rating"], json!(6));

    let persisted = ledger_in(&dir);
    assert_eq!(persisted.len(), 3);
    assert!(persisted.contains("2401.00001v1"));
}

#[tokio::test]
async fn test_second_batch_skips_processed_papers() {
    let dir = tempfile::tempdir().unwrap();

    let first_uploader = RecordingUploader::new();
    let first = processor(
        ScriptedCompletion::always_ok(),
        Arc::new(FakePdf::default()),
        first_uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut first_batch = batch(
        StaticSource::new(vec![paper("P1")]),
        first,
        ledger_in(&dir),
        Duration::ZERO,
    );
    assert_ok!(first_batch.run(1, &CancellationToken::new()).await);
    assert_eq!(first_uploader.uploaded_ids(), vec!["P1"]);

    // 新的运行从磁盘重新加载账本
    let completion = ScriptedCompletion::always_ok();
    let uploader = RecordingUploader::new();
    let second = processor(
        completion.clone(),
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut second_batch = batch(
        StaticSource::new(vec![paper("P1"), paper("P2")]),
        second,
        ledger_in(&dir),
        Duration::ZERO,
    );
    let stats = assert_ok!(second_batch.run(2, &CancellationToken::new()).await);

    assert_eq!(stats.skipped_duplicates, 1);
    assert_eq!(uploader.uploaded_ids(), vec!["P2"]);
    assert_eq!(completion.call_count(), 3);
    assert!(completion
        .calls()
        .iter()
        .all(|(prompt, _)| !prompt.contains("arxiv.org/pdf/P1")));
}

#[tokio::test]
async fn test_auth_error_aborts_batch_without_recording() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::failing_all(UploadError::Auth { status: 401 });
    let processor = processor(
        ScriptedCompletion::always_ok(),
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(StaticSource::new(papers(10)), processor, ledger_in(&dir), Duration::ZERO);

    let err = assert_err!(batch.run(1, &CancellationToken::new()).await);

    assert!(matches!(err, AppError::Upload(UploadError::Auth { status: 401 })));
    assert_eq!(uploader.attempts(), 1);
    assert!(uploader.uploads().is_empty());
    assert!(batch.ledger().is_empty());
    assert!(ledger_in(&dir).is_empty());
}

#[tokio::test]
async fn test_network_error_leaves_paper_for_next_batch() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::new();
    uploader.fail_paper(
        "P1",
        UploadError::Network {
            message: "connection reset".to_string(),
        },
    );
    let processor = processor(
        ScriptedCompletion::always_ok(),
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(
        StaticSource::new(vec![paper("P1"), paper("P2")]),
        processor,
        ledger_in(&dir),
        Duration::ZERO,
    );

    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);
    assert_eq!(stats.deferred, 1);
    assert_eq!(stats.uploaded, 1);
    assert!(!batch.ledger().contains("P1"));
    assert!(batch.ledger().contains("P2"));

    // 网络恢复后，下一批只重试 P1
    uploader.clear_failures();
    let stats = assert_ok!(batch.run(2, &CancellationToken::new()).await);
    assert_eq!(stats.skipped_duplicates, 1);
    assert_eq!(stats.uploaded, 1);
    assert_eq!(uploader.uploaded_ids(), vec!["P2", "P1"]);
    assert!(ledger_in(&dir).contains("P1"));
}

#[tokio::test]
async fn test_rejected_upload_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::new();
    uploader.fail_paper(
        "P1",
        UploadError::Rejected {
            status: 422,
            body: "invalid categories".to_string(),
        },
    );
    let processor = processor(
        ScriptedCompletion::always_ok(),
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(StaticSource::new(vec![paper("P1")]), processor, ledger_in(&dir), Duration::ZERO);

    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(stats.rejected, 1);
    assert!(ledger_in(&dir).contains("P1"));
}

#[tokio::test]
async fn test_dry_run_neither_uploads_nor_records() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::new();
    let processor = processor(
        ScriptedCompletion::always_ok(),
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        true,
    );
    let mut batch = batch(StaticSource::new(papers(2)), processor, ledger_in(&dir), Duration::ZERO);

    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(stats.dry_run, 2);
    assert_eq!(uploader.attempts(), 0);
    assert!(batch.ledger().is_empty());
    assert!(!dir.path().join("processed_papers.json").exists());
}

#[tokio::test]
async fn test_dry_run_with_drop_policies_records_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::new();
    // P1 评分过低，P2 初始评审无法解析
    let completion = ScriptedCompletion::new(vec![
        ok(r#"{"rating": 2}"#),
        ok(r#"{"rating": 2}"#),
        ok(r#"{"rating": 2}"#),
        ok("no review"),
    ]);
    let policy = GatePolicy {
        unrated: UnratedPolicy::Drop,
        below_threshold: BelowThresholdPolicy::Drop,
        ..GatePolicy::default()
    };
    let processor = processor(
        completion,
        Arc::new(FakePdf::default()),
        uploader.clone(),
        policy,
        true,
    );
    let mut batch = batch(
        StaticSource::new(vec![paper("P1"), paper("P2")]),
        processor,
        ledger_in(&dir),
        Duration::ZERO,
    );

    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(stats.dry_run, 2);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.recorded, 0);
    assert_eq!(uploader.attempts(), 0);
    assert!(batch.ledger().is_empty());
    assert!(!dir.path().join("processed_papers.json").exists());
}

#[tokio::test]
async fn test_failed_ensemble_uploads_reflection_and_records() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::new();
    let completion = ScriptedCompletion::new(vec![
        ok(r#"{"rating": 5, "stage": "initial"}"#),
        ok(r#"{"rating": 7, "stage": "reflection"}"#),
        ok("garbage"),
    ]);
    let processor = processor(
        completion.clone(),
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(StaticSource::new(vec![paper("P1")]), processor, ledger_in(&dir), Duration::ZERO);

    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(completion.call_count(), 3);
    assert_eq!(stats.uploaded_with_review, 1);
    let review = uploader.uploads()[0].review.clone().unwrap();
    assert_eq!(review["rating"], json!(7));
    assert_eq!(review["stage"], json!("reflection"));
    assert!(ledger_in(&dir).contains("P1"));
}

#[tokio::test]
async fn test_low_rating_uploads_metadata_only() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::new();
    let completion = ScriptedCompletion::new(vec![
        ok(r#"{"rating": 3}"#),
        ok(r#"{"rating": 3}"#),
        ok(r#"{"rating": 4}"#),
    ]);
    let processor = processor(
        completion,
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(StaticSource::new(vec![paper("P1")]), processor, ledger_in(&dir), Duration::ZERO);

    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(stats.uploaded, 1);
    assert_eq!(stats.uploaded_with_review, 0);
    assert!(uploader.uploads()[0].review.is_none());
    assert!(batch.ledger().contains("P1"));
}

#[tokio::test]
async fn test_low_rating_dropped_but_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::new();
    let completion = ScriptedCompletion::new(vec![
        ok(r#"{"rating": 2}"#),
        ok(r#"{"rating": 2}"#),
        ok(r#"{"rating": 2}"#),
    ]);
    let policy = GatePolicy {
        below_threshold: BelowThresholdPolicy::Drop,
        ..GatePolicy::default()
    };
    let processor = processor(
        completion,
        Arc::new(FakePdf::default()),
        uploader.clone(),
        policy,
        false,
    );
    let mut batch = batch(StaticSource::new(vec![paper("P1")]), processor, ledger_in(&dir), Duration::ZERO);

    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(stats.dropped, 1);
    assert_eq!(uploader.attempts(), 0);
    assert!(ledger_in(&dir).contains("P1"));
}

#[tokio::test]
async fn test_missing_pdf_still_uploads_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let completion = ScriptedCompletion::always_ok();
    let uploader = RecordingUploader::new();
    let pdf = Arc::new(FakePdf {
        fail_download: true,
        ..FakePdf::default()
    });
    let processor = processor(
        completion.clone(),
        pdf,
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(StaticSource::new(vec![paper("P1")]), processor, ledger_in(&dir), Duration::ZERO);

    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(stats.uploaded, 1);
    assert_eq!(completion.call_count(), 0);
    let upload = &uploader.uploads()[0];
    assert!(!upload.has_pdf);
    assert!(upload.review.is_none());
    assert!(batch.ledger().contains("P1"));
}

#[tokio::test]
async fn test_extraction_failure_keeps_pdf_but_skips_review() {
    let dir = tempfile::tempdir().unwrap();
    let completion = ScriptedCompletion::always_ok();
    let uploader = RecordingUploader::new();
    let pdf = Arc::new(FakePdf {
        fail_extract: true,
        ..FakePdf::default()
    });
    let processor = processor(
        completion.clone(),
        pdf,
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(StaticSource::new(vec![paper("P1")]), processor, ledger_in(&dir), Duration::ZERO);

    assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(completion.call_count(), 0);
    let upload = &uploader.uploads()[0];
    assert!(upload.has_pdf);
    assert!(upload.review.is_none());
}

#[tokio::test]
async fn test_cancelled_batch_processes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::new();
    let source = StaticSource::new(papers(3));
    let processor = processor(
        ScriptedCompletion::always_ok(),
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(source.clone(), processor, ledger_in(&dir), Duration::ZERO);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let stats = assert_ok!(batch.run(1, &cancel).await);

    assert_eq!(source.fetch_count(), 1);
    assert!(stats.cancelled);
    assert_eq!(uploader.attempts(), 0);
    assert!(batch.ledger().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delay_between_papers_only() {
    let dir = tempfile::tempdir().unwrap();
    let processor = processor(
        ScriptedCompletion::always_ok(),
        Arc::new(FakePdf::default()),
        RecordingUploader::new(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(
        StaticSource::new(papers(3)),
        processor,
        ledger_in(&dir),
        Duration::from_secs(10),
    );

    let started = tokio::time::Instant::now();
    let stats = assert_ok!(batch.run(1, &CancellationToken::new()).await);

    assert_eq!(stats.uploaded, 3);
    // 三篇论文之间两次等待，最后一篇之后不等待
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(20));
    assert!(elapsed < Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_delay_stops_batch() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = RecordingUploader::new();
    let processor = processor(
        ScriptedCompletion::always_ok(),
        Arc::new(FakePdf::default()),
        uploader.clone(),
        GatePolicy::default(),
        false,
    );
    let mut batch = batch(
        StaticSource::new(papers(3)),
        processor,
        ledger_in(&dir),
        Duration::from_secs(10),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let stats = assert_ok!(batch.run(1, &cancel).await);

    assert!(stats.cancelled);
    assert_eq!(uploader.uploaded_ids(), vec!["2401.00001v1"]);
    assert_eq!(batch.ledger().len(), 1);
}
