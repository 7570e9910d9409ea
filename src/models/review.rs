//! 评审数据模型

use std::fmt;

use serde_json::{Map, Value};

/// 单次模型调用产出的结构化评审
///
/// 字段由模型决定（strengths、weaknesses、rating ...），其中 `rating` 用于适当性判定。
pub type ReviewDraft = Map<String, Value>;

/// 集成后的最终评审，形状与 `ReviewDraft` 相同
pub type EnsembleResult = ReviewDraft;

/// 一轮反思的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionRound {
    /// 轮次（从 0 开始）
    pub index: usize,
    pub draft: ReviewDraft,
}

/// 评审流程中的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageName {
    Initial,
    Reflect(usize),
    Ensemble,
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageName::Initial => write!(f, "INITIAL"),
            StageName::Reflect(k) => write!(f, "REFLECT({})", k),
            StageName::Ensemble => write!(f, "ENSEMBLE"),
        }
    }
}

/// 各阶段实际成功情况（仅用于观测）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// 配置的反思轮数
    pub reflections_planned: usize,
    pub initial_ok: bool,
    /// 成功的反思轮次
    pub reflections_ok: Vec<usize>,
    /// 失败的反思轮次（失败后不再继续反思）
    pub reflection_failed: Option<usize>,
    /// 模型声明 "I am done" 提前结束
    pub early_stopped: bool,
    /// None 表示未执行集成
    pub ensemble_ok: Option<bool>,
    /// 实际发出的补全请求数（含重试）
    pub completion_calls: usize,
}

/// 评审结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    /// 所有执行的阶段都成功
    Complete,
    /// 有评审，但部分阶段失败后回退
    Degraded,
    /// 没有得到任何评审
    Failed,
    /// 没有可用文本，未调用模型
    Skipped,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReviewStatus::Complete => "完整",
            ReviewStatus::Degraded => "降级",
            ReviewStatus::Failed => "失败",
            ReviewStatus::Skipped => "跳过",
        };
        write!(f, "{}", label)
    }
}

/// 评审流程的输出
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub review: Option<EnsembleResult>,
    pub report: StageReport,
}

impl ReviewOutcome {
    /// 没有文本可评审时的结果
    pub fn skipped() -> Self {
        Self {
            review: None,
            report: StageReport::default(),
        }
    }

    pub fn status(&self) -> ReviewStatus {
        let report = &self.report;
        if self.review.is_none() {
            if report.completion_calls == 0 {
                ReviewStatus::Skipped
            } else {
                ReviewStatus::Failed
            }
        } else if report.initial_ok
            && report.reflection_failed.is_none()
            && report.ensemble_ok == Some(true)
        {
            ReviewStatus::Complete
        } else {
            ReviewStatus::Degraded
        }
    }
}
