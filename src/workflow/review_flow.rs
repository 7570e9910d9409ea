//! 评审流程 - 流程层
//!
//! 核心职责：为"一篇论文"生成一份结构化评审
//!
//! 状态机：
//! ```text
//! INITIAL ──ok──> REFLECTING(0) ──> ... ──> REFLECTING(N-1) ──> ENSEMBLE ──> DONE
//!    │                  └──失败 / "I am done"──────────────────────┘
//!    └──失败──> FAILED
//! ```
//!
//! 每个阶段的产出都是 `Option<ReviewDraft>`，失败时沿用上一份成功的草稿，
//! 只有 INITIAL 失败才会得到空评审。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{PromptSet, ReflectionRound, ReviewDraft, ReviewOutcome, StageName, StageReport};
use crate::services::{parse_review_output, CompletionService};
use crate::workflow::paper_ctx::PaperCtx;

/// 模型认为无需继续修改时的标记（不区分大小写）
const DONE_MARKER: &str = "i am done";

/// 评审流程参数
#[derive(Debug, Clone)]
pub struct ReviewSettings {
    /// 反思轮数 N
    pub reflection_rounds: usize,
    /// 送入模型的最大字符数，0 表示不限制
    pub max_text_chars: usize,
    /// 限流/超时时的额外尝试次数
    pub completion_retries: usize,
    /// 第 k 次重试前等待 `retry_backoff * k`
    pub retry_backoff: Duration,
}

impl ReviewSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            reflection_rounds: config.reviewer_reflection,
            max_text_chars: config.max_pdf_text_length,
            completion_retries: config.completion_retries,
            retry_backoff: config.completion_retry_backoff(),
        }
    }

    /// 第 `attempt` 次重试前的等待时间
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
        self.retry_backoff.saturating_mul(factor)
    }
}

/// 评审状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewState {
    Initial,
    Reflecting { round: usize },
    Ensemble,
    Done,
    Failed,
}

/// 单个阶段解析成功的回复
struct StageReply {
    draft: ReviewDraft,
    done: bool,
}

/// 评审流程
///
/// - 编排 初始评审 → 反思 → 集成
/// - 阶段失败只降级，不向上抛错
/// - 不关心论文从哪来、评审交给谁
pub struct ReviewFlow {
    completion: Arc<dyn CompletionService>,
    prompts: PromptSet,
    settings: ReviewSettings,
}

impl ReviewFlow {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        prompts: PromptSet,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            completion,
            prompts,
            settings,
        }
    }

    pub fn settings(&self) -> &ReviewSettings {
        &self.settings
    }

    /// 对论文文本执行完整评审
    ///
    /// 文本为空时不调用模型，直接返回 `ReviewOutcome::skipped()`。
    pub async fn run(&self, ctx: &PaperCtx, paper_text: &str) -> ReviewOutcome {
        let text = truncate_chars(paper_text, self.settings.max_text_chars);
        if text.trim().is_empty() {
            warn!("{} ⚠️ 没有可评审的文本，跳过评审", ctx);
            return ReviewOutcome::skipped();
        }
        if text.len() < paper_text.len() {
            info!(
                "{} ✂️ 文本超过 {} 字符，已截断",
                ctx, self.settings.max_text_chars
            );
        }

        let total_rounds = self.settings.reflection_rounds;
        let mut report = StageReport {
            reflections_planned: total_rounds,
            ..Default::default()
        };
        let mut initial: Option<ReviewDraft> = None;
        let mut reflections: Vec<ReflectionRound> = Vec::new();
        let mut review: Option<ReviewDraft> = None;
        let mut state = ReviewState::Initial;

        loop {
            debug!("{} 评审状态: {:?}", ctx, state);
            state = match state {
                ReviewState::Initial => {
                    let prompt = self.prompts.render_review(text);
                    match self
                        .call_stage(
                            ctx,
                            StageName::Initial,
                            &prompt,
                            &self.prompts.reviewer_system,
                            &mut report,
                        )
                        .await
                    {
                        Some(reply) => {
                            report.initial_ok = true;
                            initial = Some(reply.draft);
                            if total_rounds > 0 {
                                ReviewState::Reflecting { round: 0 }
                            } else {
                                ReviewState::Ensemble
                            }
                        }
                        None => ReviewState::Failed,
                    }
                }

                ReviewState::Reflecting { round } => {
                    let Some(previous) = reflections.last().map(|r| &r.draft).or(initial.as_ref())
                    else {
                        break;
                    };
                    let prompt = self.prompts.render_reflection(round, total_rounds, previous);
                    match self
                        .call_stage(
                            ctx,
                            StageName::Reflect(round),
                            &prompt,
                            &self.prompts.reviewer_system,
                            &mut report,
                        )
                        .await
                    {
                        Some(reply) => {
                            report.reflections_ok.push(round);
                            reflections.push(ReflectionRound {
                                index: round,
                                draft: reply.draft,
                            });
                            if reply.done {
                                info!("{} 🏁 第 {} 轮反思后模型表示已完成", ctx, round + 1);
                                report.early_stopped = true;
                                ReviewState::Ensemble
                            } else if round + 1 < total_rounds {
                                ReviewState::Reflecting { round: round + 1 }
                            } else {
                                ReviewState::Ensemble
                            }
                        }
                        None => {
                            report.reflection_failed = Some(round);
                            ReviewState::Ensemble
                        }
                    }
                }

                ReviewState::Ensemble => {
                    let drafts: Vec<&ReviewDraft> = initial
                        .iter()
                        .chain(reflections.iter().map(|r| &r.draft))
                        .collect();
                    let system = self.prompts.render_ensemble_system(drafts.len());
                    let prompt = self.prompts.render_ensemble(&drafts);

                    match self
                        .call_stage(ctx, StageName::Ensemble, &prompt, &system, &mut report)
                        .await
                    {
                        Some(reply) => {
                            report.ensemble_ok = Some(true);
                            review = Some(reply.draft);
                        }
                        None => {
                            report.ensemble_ok = Some(false);
                            warn!("{} ⚠️ 集成失败，使用最后一份成功的草稿", ctx);
                            review = reflections
                                .pop()
                                .map(|r| r.draft)
                                .or_else(|| initial.take());
                        }
                    }
                    ReviewState::Done
                }

                ReviewState::Done | ReviewState::Failed => break,
            };
        }

        let outcome = ReviewOutcome { review, report };
        info!(
            "{} 📝 评审结束: {} (模型调用 {} 次)",
            ctx,
            outcome.status(),
            outcome.report.completion_calls
        );
        outcome
    }

    /// 执行一个阶段：调用模型（限流/超时时重试）并解析回复
    async fn call_stage(
        &self,
        ctx: &PaperCtx,
        stage: StageName,
        prompt: &str,
        system: &str,
        report: &mut StageReport,
    ) -> Option<StageReply> {
        let mut attempt = 0;
        loop {
            report.completion_calls += 1;
            match self.completion.complete(prompt, system).await {
                Ok(text) => {
                    return match parse_review_output(&text) {
                        Ok(draft) => {
                            debug!("{} ✓ {} 完成", ctx, stage);
                            Some(StageReply {
                                draft,
                                done: text.to_lowercase().contains(DONE_MARKER),
                            })
                        }
                        Err(e) => {
                            warn!("{} ⚠️ {} 输出无法解析: {}", ctx, stage, e);
                            None
                        }
                    };
                }
                Err(e) if e.is_retryable() && attempt < self.settings.completion_retries => {
                    attempt += 1;
                    let wait = self.settings.backoff_for(attempt);
                    warn!(
                        "{} ⚠️ {} 调用失败，{:.1} 秒后第 {} 次重试: {}",
                        ctx,
                        stage,
                        wait.as_secs_f64(),
                        attempt,
                        e
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    warn!("{} ❌ {} 调用失败: {}", ctx, stage, e);
                    return None;
                }
            }
        }
    }
}

/// 按字符数截断，只保留开头部分
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return text;
    }
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
