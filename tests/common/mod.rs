//! 测试用的外部协作者替身
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arxiv_review_crawler::clients::{PaperSource, PdfService, SortKey, SortOrder, UploadService};
use arxiv_review_crawler::error::{CompletionError, FetchError, PdfError, UploadError};
use arxiv_review_crawler::models::{PaperRecord, PromptSet, ReviewDraft, UploadFields};
use arxiv_review_crawler::services::{AppropriatenessGate, CompletionService, DedupLedger, GatePolicy};
use arxiv_review_crawler::{CrawlBatch, PaperProcessor, ReviewFlow, ReviewSettings};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

pub const DEFAULT_REPLY: &str = r#"{"summary": "ok", "rating": 6}"#;

/// 按顺序返回预设回复的补全服务，脚本用完后返回 `DEFAULT_REPLY`
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn always_ok() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 每次调用的 (prompt, system)
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), system.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()))
    }
}

pub fn ok(text: &str) -> Result<String, CompletionError> {
    Ok(text.to_string())
}

pub fn service_error() -> Result<String, CompletionError> {
    Err(CompletionError::ServiceError {
        model: "test-model".to_string(),
        message: "boom".to_string(),
    })
}

pub fn rate_limited() -> Result<String, CompletionError> {
    Err(CompletionError::RateLimited {
        model: "test-model".to_string(),
        message: "slow down".to_string(),
    })
}

/// 固定返回一组论文的来源
pub struct StaticSource {
    papers: Vec<PaperRecord>,
    fetches: Mutex<usize>,
}

impl StaticSource {
    pub fn new(papers: Vec<PaperRecord>) -> Arc<Self> {
        Arc::new(Self {
            papers,
            fetches: Mutex::new(0),
        })
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl PaperSource for StaticSource {
    async fn fetch(
        &self,
        max_results: usize,
        _sort_key: SortKey,
        _sort_order: SortOrder,
    ) -> Result<Vec<PaperRecord>, FetchError> {
        *self.fetches.lock().unwrap() += 1;
        Ok(self.papers.iter().take(max_results).cloned().collect())
    }
}

/// PDF 替身：下载得到 `text of <url>` 的字节，提取即按 UTF-8 解码
#[derive(Default)]
pub struct FakePdf {
    pub fail_download: bool,
    pub fail_extract: bool,
}

#[async_trait]
impl PdfService for FakePdf {
    async fn download(&self, url: &str) -> Result<Vec<u8>, PdfError> {
        if self.fail_download {
            return Err(PdfError::Download {
                url: url.to_string(),
                message: "HTTP 404".to_string(),
            });
        }
        Ok(format!("text of {}", url).into_bytes())
    }

    async fn extract_text(&self, bytes: &[u8]) -> Result<String, PdfError> {
        if self.fail_extract {
            return Err(PdfError::Extraction {
                message: "broken xref".to_string(),
            });
        }
        Ok(String::from_utf8_lossy(bytes).to_string())
    }
}

/// 一次上传记录
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub paper_id: String,
    pub review: Option<ReviewDraft>,
    pub has_pdf: bool,
}

/// 记录上传请求的替身，可为指定论文或所有论文注入错误
#[derive(Default)]
pub struct RecordingUploader {
    uploads: Mutex<Vec<UploadRecord>>,
    attempts: Mutex<usize>,
    failures: Mutex<HashMap<String, UploadError>>,
    fail_all: Mutex<Option<UploadError>>,
}

impl RecordingUploader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_all(error: UploadError) -> Arc<Self> {
        let uploader = Self::default();
        *uploader.fail_all.lock().unwrap() = Some(error);
        Arc::new(uploader)
    }

    pub fn fail_paper(&self, paper_id: &str, error: UploadError) {
        self.failures
            .lock()
            .unwrap()
            .insert(paper_id.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// 成功的上传
    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn uploaded_ids(&self) -> Vec<String> {
        self.uploads().into_iter().map(|u| u.paper_id).collect()
    }

    /// 包括失败在内的上传尝试次数
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl UploadService for RecordingUploader {
    async fn upload(
        &self,
        fields: &UploadFields,
        review: Option<&ReviewDraft>,
        pdf: Option<&[u8]>,
    ) -> Result<(), UploadError> {
        *self.attempts.lock().unwrap() += 1;
        if let Some(error) = self.fail_all.lock().unwrap().clone() {
            return Err(error);
        }
        if let Some(error) = self.failures.lock().unwrap().get(&fields.paper_id).cloned() {
            return Err(error);
        }
        self.uploads.lock().unwrap().push(UploadRecord {
            paper_id: fields.paper_id.clone(),
            review: review.cloned(),
            has_pdf: pdf.is_some(),
        });
        Ok(())
    }
}

pub fn paper(id: &str) -> PaperRecord {
    PaperRecord {
        id: id.to_string(),
        title: format!("Paper {}", id),
        authors: vec!["Ada Lovelace".to_string()],
        categories: vec!["cs.LG".to_string()],
        summary: "An abstract.".to_string(),
        published: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        url: format!("http://arxiv.org/abs/{}", id),
        pdf_url: format!("http://arxiv.org/pdf/{}", id),
        doi: None,
    }
}

pub fn papers(count: usize) -> Vec<PaperRecord> {
    (1..=count).map(|i| paper(&format!("2401.{:05}v1", i))).collect()
}

pub fn settings(reflection_rounds: usize) -> ReviewSettings {
    ReviewSettings {
        reflection_rounds,
        max_text_chars: 100_000,
        completion_retries: 2,
        retry_backoff: Duration::ZERO,
    }
}

pub fn review_flow(completion: Arc<ScriptedCompletion>, reflection_rounds: usize) -> ReviewFlow {
    ReviewFlow::new(completion, PromptSet::default(), settings(reflection_rounds))
}

pub fn processor(
    completion: Arc<ScriptedCompletion>,
    pdf: Arc<FakePdf>,
    uploader: Arc<RecordingUploader>,
    policy: GatePolicy,
    dry_run: bool,
) -> PaperProcessor {
    PaperProcessor::new(
        pdf,
        uploader,
        review_flow(completion, 1),
        AppropriatenessGate::new(policy),
        dry_run,
    )
}

pub fn batch(
    source: Arc<StaticSource>,
    processor: PaperProcessor,
    ledger: DedupLedger,
    request_delay: Duration,
) -> CrawlBatch {
    CrawlBatch::new(source, processor, ledger, 100, request_delay)
}
