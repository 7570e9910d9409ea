//! 单篇论文处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一篇论文的完整流水线，是论文级别的编排器。
//!
//! 1. **获取 PDF**：下载失败时不带 PDF 继续
//! 2. **提取文本**：提取失败时以空文本继续（评审会被跳过）
//! 3. **生成评审**：委托 `ReviewFlow`
//! 4. **适当性判定**：委托 `AppropriatenessGate`
//! 5. **上传**：按判定结果带/不带评审上传，或丢弃
//!
//! 只有认证失败会以 `Err` 返回，其它情况都归入 `PaperOutcome`。

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::{PdfService, UploadService};
use crate::error::UploadError;
use crate::models::{PaperRecord, ReviewStatus};
use crate::services::{AppropriatenessGate, Disposition, GateDecision};
use crate::utils::logging::truncate_text;
use crate::workflow::{PaperCtx, ReviewFlow};

/// 单篇论文的处理结果
#[derive(Debug, Clone)]
pub enum PaperOutcome {
    /// 已上传
    Uploaded {
        with_review: bool,
        review_status: ReviewStatus,
    },
    /// 判定为丢弃
    Dropped { decision: GateDecision },
    /// 演练模式：只走到判定为止，不上传也不记账
    DryRun { decision: GateDecision },
    /// 后端拒绝该论文，重试无意义
    UploadRejected { error: UploadError },
    /// 暂时性上传失败，下一批次重试
    UploadDeferred { error: UploadError },
}

impl PaperOutcome {
    /// 是否写入去重账本
    pub fn should_record(&self) -> bool {
        match self {
            PaperOutcome::Uploaded { .. }
            | PaperOutcome::Dropped { .. }
            | PaperOutcome::UploadRejected { .. } => true,
            PaperOutcome::DryRun { .. } | PaperOutcome::UploadDeferred { .. } => false,
        }
    }
}

impl fmt::Display for PaperOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperOutcome::Uploaded {
                with_review: true,
                review_status,
            } => write!(f, "已上传（含评审, {}）", review_status),
            PaperOutcome::Uploaded { .. } => write!(f, "已上传（无评审）"),
            PaperOutcome::Dropped { decision } => write!(f, "已丢弃（{}）", decision),
            PaperOutcome::DryRun { decision } => write!(f, "演练模式，未上传（{}）", decision),
            PaperOutcome::UploadRejected { error } => write!(f, "后端拒绝: {}", error),
            PaperOutcome::UploadDeferred { error } => write!(f, "暂缓，下次重试: {}", error),
        }
    }
}

/// 单篇论文处理器
pub struct PaperProcessor {
    pdf: Arc<dyn PdfService>,
    uploader: Arc<dyn UploadService>,
    review_flow: ReviewFlow,
    gate: AppropriatenessGate,
    dry_run: bool,
}

impl PaperProcessor {
    pub fn new(
        pdf: Arc<dyn PdfService>,
        uploader: Arc<dyn UploadService>,
        review_flow: ReviewFlow,
        gate: AppropriatenessGate,
        dry_run: bool,
    ) -> Self {
        Self {
            pdf,
            uploader,
            review_flow,
            gate,
            dry_run,
        }
    }

    /// 处理单篇论文
    ///
    /// # 返回
    /// - `Ok(outcome)`：论文处理结束（无论成败），由调用方决定是否记账
    /// - `Err(UploadError::Auth)`：凭证无效，批次必须立即终止
    pub async fn process(
        &self,
        ctx: &PaperCtx,
        paper: &PaperRecord,
    ) -> Result<PaperOutcome, UploadError> {
        log_paper_start(ctx, paper);

        let pdf_bytes = self.fetch_pdf(ctx, paper).await;
        let text = match pdf_bytes.as_deref() {
            Some(bytes) => self.extract_text(ctx, bytes).await,
            None => String::new(),
        };

        let review = self.review_flow.run(ctx, &text).await;
        let decision = self.gate.evaluate(review.review.as_ref());
        info!("{} ⚖️ 判定: {}", ctx, decision);

        // 演练模式下丢弃的论文也不能进账本
        if self.dry_run {
            return Ok(PaperOutcome::DryRun { decision });
        }

        let attached = match decision.disposition {
            Disposition::Drop => return Ok(PaperOutcome::Dropped { decision }),
            Disposition::UploadWithReview => review.review.as_ref(),
            Disposition::UploadWithoutReview => None,
        };

        info!("{} 📤 正在上传...", ctx);
        let fields = paper.upload_fields();
        match self
            .uploader
            .upload(&fields, attached, pdf_bytes.as_deref())
            .await
        {
            Ok(()) => Ok(PaperOutcome::Uploaded {
                with_review: attached.is_some(),
                review_status: review.status(),
            }),
            Err(e) if e.is_fatal() => {
                error!("{} ❌ 上传认证失败，终止批次: {}", ctx, e);
                Err(e)
            }
            Err(e) if e.is_retryable() => {
                warn!("{} ⚠️ 上传失败，下一批次重试: {}", ctx, e);
                Ok(PaperOutcome::UploadDeferred { error: e })
            }
            Err(e) => {
                warn!("{} ⚠️ 后端拒绝上传: {}", ctx, e);
                Ok(PaperOutcome::UploadRejected { error: e })
            }
        }
    }

    async fn fetch_pdf(&self, ctx: &PaperCtx, paper: &PaperRecord) -> Option<Vec<u8>> {
        match self.pdf.download(&paper.pdf_url).await {
            Ok(bytes) => {
                info!("{} ✓ PDF 下载完成 ({} KB)", ctx, bytes.len() / 1024);
                Some(bytes)
            }
            Err(e) => {
                warn!("{} ⚠️ PDF 下载失败，不带 PDF 继续: {}", ctx, e);
                None
            }
        }
    }

    async fn extract_text(&self, ctx: &PaperCtx, bytes: &[u8]) -> String {
        match self.pdf.extract_text(bytes).await {
            Ok(text) => {
                info!("{} ✓ 文本提取完成 ({} 字符)", ctx, text.chars().count());
                text
            }
            Err(e) => {
                warn!("{} ⚠️ 文本提取失败，以空文本继续: {}", ctx, e);
                String::new()
            }
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_paper_start(ctx: &PaperCtx, paper: &PaperRecord) {
    info!("\n{} {}", ctx, "─".repeat(30));
    info!("{} 标题: {}", ctx, truncate_text(&paper.title, 80));
    info!("{} 作者: {}", ctx, truncate_text(&paper.authors.join(", "), 80));
    info!(
        "{} 分类: {} | 发布: {}",
        ctx,
        paper.categories.join(", "),
        paper.published.format("%Y-%m-%d %H:%M")
    );
}
