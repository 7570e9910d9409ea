//! 批量论文处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批次的调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：加载提示词、创建各个客户端、打开去重账本
//! 2. **获取论文**：按提交时间倒序拉取候选论文
//! 3. **去重**：跳过账本中已有的论文
//! 4. **串行处理**：逐篇委托 `PaperProcessor`，两篇之间固定间隔
//! 5. **记账**：每篇结束后立即落盘
//! 6. **取消**：只在两篇之间检查，正在处理的论文会跑完
//!
//! ## 设计特点
//!
//! - **严格串行**：同一时刻只有一篇论文在处理，账本只有一个写入者
//! - **故障隔离**：单篇失败不影响批次，只有认证失败会终止

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clients::{ArxivClient, BackendClient, PaperSource, PdfClient, SortKey, SortOrder};
use crate::config::{Config, CrawlMode};
use crate::error::{AppError, AppResult};
use crate::models::load_prompts_or_default;
use crate::orchestrator::paper_processor::{PaperOutcome, PaperProcessor};
use crate::services::{AppropriatenessGate, DedupLedger, LlmService};
use crate::utils::logging::{log_batch_start, log_location, log_startup, print_batch_stats};
use crate::workflow::{PaperCtx, ReviewFlow, ReviewSettings};

/// 批次统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub fetched: usize,
    pub skipped_duplicates: usize,
    pub uploaded: usize,
    pub uploaded_with_review: usize,
    pub dropped: usize,
    pub rejected: usize,
    pub deferred: usize,
    pub dry_run: usize,
    /// 本批写入账本的论文数
    pub recorded: usize,
    pub cancelled: bool,
}

impl BatchStats {
    fn count(&mut self, outcome: &PaperOutcome) {
        match outcome {
            PaperOutcome::Uploaded { with_review, .. } => {
                self.uploaded += 1;
                if *with_review {
                    self.uploaded_with_review += 1;
                }
            }
            PaperOutcome::Dropped { .. } => self.dropped += 1,
            PaperOutcome::DryRun { .. } => self.dry_run += 1,
            PaperOutcome::UploadRejected { .. } => self.rejected += 1,
            PaperOutcome::UploadDeferred { .. } => self.deferred += 1,
        }
    }
}

/// 一个抓取批次
pub struct CrawlBatch {
    source: Arc<dyn PaperSource>,
    processor: PaperProcessor,
    ledger: DedupLedger,
    max_results: usize,
    request_delay: Duration,
}

impl CrawlBatch {
    pub fn new(
        source: Arc<dyn PaperSource>,
        processor: PaperProcessor,
        ledger: DedupLedger,
        max_results: usize,
        request_delay: Duration,
    ) -> Self {
        Self {
            source,
            processor,
            ledger,
            max_results,
            request_delay,
        }
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// 执行一个批次
    ///
    /// # 返回
    /// - `Ok(stats)`：批次结束（可能被取消）
    /// - `Err`：获取失败、上传认证失败或账本写盘失败
    pub async fn run(&mut self, batch_num: usize, cancel: &CancellationToken) -> AppResult<BatchStats> {
        let papers = self
            .source
            .fetch(self.max_results, SortKey::SubmittedDate, SortOrder::Descending)
            .await?;

        let mut stats = BatchStats {
            fetched: papers.len(),
            ..Default::default()
        };
        let pending = papers
            .iter()
            .filter(|p| !self.ledger.contains(&p.id))
            .count();
        log_batch_start(batch_num, papers.len(), pending);

        let mut index = 0;
        let mut processed_any = false;

        for paper in &papers {
            if cancel.is_cancelled() {
                warn!("⛔ 收到取消信号，停止处理剩余论文");
                stats.cancelled = true;
                break;
            }

            if self.ledger.contains(&paper.id) {
                stats.skipped_duplicates += 1;
                continue;
            }

            if processed_any && !self.request_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        warn!("⛔ 等待期间收到取消信号，停止处理剩余论文");
                        stats.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.request_delay) => {}
                }
            }

            index += 1;
            processed_any = true;
            let ctx = PaperCtx::new(paper.id.clone(), index, pending);

            let outcome = match self.processor.process(&ctx, paper).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{} ❌ 批次终止: {}", ctx, e);
                    return Err(AppError::Upload(e));
                }
            };

            info!("{} 结果: {}", ctx, outcome);
            stats.count(&outcome);

            if outcome.should_record() {
                self.ledger.record(&paper.id)?;
                stats.recorded += 1;
            }
        }

        Ok(stats)
    }
}

/// 运行选项（来自命令行）
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: CrawlMode,
    pub watch: bool,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: CrawlMode::Latest,
            watch: false,
            dry_run: false,
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    options: RunOptions,
    batch: CrawlBatch,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config, options: RunOptions) -> AppResult<Self> {
        log_startup(&config, options.mode, options.watch, options.dry_run);

        let prompts = load_prompts_or_default(config.prompts_file.as_deref()).await?;

        let source = Arc::new(ArxivClient::new(&config)?);
        let pdf = Arc::new(PdfClient::new(&config).map_err(|e| AppError::Init(e.to_string()))?);
        let uploader = Arc::new(BackendClient::new(&config)?);
        let completion = Arc::new(LlmService::new(&config));

        let review_flow = ReviewFlow::new(completion, prompts, ReviewSettings::from_config(&config));
        let gate = AppropriatenessGate::new(config.gate_policy());
        let processor = PaperProcessor::new(pdf, uploader, review_flow, gate, options.dry_run);

        let ledger = DedupLedger::open(&config.processed_papers_file)?;
        info!(
            "📚 去重账本: {} ({} 篇已处理)",
            ledger.path().display(),
            ledger.len()
        );

        let batch = CrawlBatch::new(
            source,
            processor,
            ledger,
            config.max_results(options.mode),
            config.request_delay(),
        );

        Ok(Self {
            config,
            options,
            batch,
        })
    }

    /// 运行应用主逻辑
    ///
    /// 单次模式跑一批后返回；持续模式每隔 `CRAWL_INTERVAL_SECS` 跑一批，直到取消。
    pub async fn run(&mut self, cancel: CancellationToken) -> AppResult<()> {
        let mut batch_num = 0;

        loop {
            batch_num += 1;
            let started = Instant::now();

            match self.batch.run(batch_num, &cancel).await {
                Ok(stats) => print_batch_stats(batch_num, &stats, started.elapsed()),
                Err(AppError::Fetch(e)) if self.options.watch => {
                    // 持续模式下获取失败只影响本批
                    error!("❌ 第 {} 批获取论文失败: {}", batch_num, e);
                }
                Err(e) => return Err(e),
            }

            if !self.options.watch || cancel.is_cancelled() {
                break;
            }

            info!(
                "💤 {} 秒后开始下一批...",
                self.config.crawl_interval().as_secs()
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.crawl_interval()) => {}
            }
        }

        info!("\n日志已保存至: {}", log_location(&self.config.log_dir));
        Ok(())
    }
}
