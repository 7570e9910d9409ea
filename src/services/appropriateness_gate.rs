//! 适当性判定 - 业务能力层
//!
//! 从最终评审中取出评分，与阈值比较（`>=`）。
//! 没有评分（评审失败或字段缺失/非数字）时按配置的默认策略处理，绝不报错。

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ConfigError;
use crate::models::review::ReviewDraft;

/// 依次查找的评分字段
const RATING_KEYS: [&str; 2] = ["rating", "overall_score"];

/// 无评分论文的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnratedPolicy {
    /// 不带评审上传（默认，评审子系统故障不影响抓取覆盖率）
    AcceptWithoutReview,
    /// 丢弃
    Drop,
}

/// 评分低于阈值时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BelowThresholdPolicy {
    /// 只上传元数据
    UploadMetadata,
    /// 丢弃
    Drop,
}

impl FromStr for UnratedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept_without_review" | "accept" => Ok(UnratedPolicy::AcceptWithoutReview),
            "drop" => Ok(UnratedPolicy::Drop),
            _ => Err(ConfigError::InvalidValue {
                var_name: "UNRATED_POLICY".to_string(),
                value: s.to_string(),
                expected: "accept_without_review | drop".to_string(),
            }),
        }
    }
}

impl FromStr for BelowThresholdPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upload_metadata" | "metadata" => Ok(BelowThresholdPolicy::UploadMetadata),
            "drop" => Ok(BelowThresholdPolicy::Drop),
            _ => Err(ConfigError::InvalidValue {
                var_name: "BELOW_THRESHOLD_POLICY".to_string(),
                value: s.to_string(),
                expected: "upload_metadata | drop".to_string(),
            }),
        }
    }
}

/// 判定策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    pub threshold: i64,
    pub unrated: UnratedPolicy,
    pub below_threshold: BelowThresholdPolicy,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            threshold: 5,
            unrated: UnratedPolicy::AcceptWithoutReview,
            below_threshold: BelowThresholdPolicy::UploadMetadata,
        }
    }
}

/// 评分结论
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Accepted { rating: f64 },
    BelowThreshold { rating: f64 },
    Unrated,
}

/// 后续处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    UploadWithReview,
    UploadWithoutReview,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub verdict: Verdict,
    pub disposition: Disposition,
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verdict {
            Verdict::Accepted { rating } => write!(f, "通过 (评分 {})", rating),
            Verdict::BelowThreshold { rating } => write!(f, "未达阈值 (评分 {})", rating),
            Verdict::Unrated => write!(f, "无评分"),
        }
    }
}

/// 适当性判定
#[derive(Debug, Clone, Copy, Default)]
pub struct AppropriatenessGate {
    policy: GatePolicy,
}

impl AppropriatenessGate {
    pub fn new(policy: GatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// 对最终评审作出判定
    pub fn evaluate(&self, review: Option<&ReviewDraft>) -> GateDecision {
        match review.and_then(extract_rating) {
            Some(rating) if rating >= self.policy.threshold as f64 => GateDecision {
                verdict: Verdict::Accepted { rating },
                disposition: Disposition::UploadWithReview,
            },
            Some(rating) => GateDecision {
                verdict: Verdict::BelowThreshold { rating },
                disposition: match self.policy.below_threshold {
                    BelowThresholdPolicy::UploadMetadata => Disposition::UploadWithoutReview,
                    BelowThresholdPolicy::Drop => Disposition::Drop,
                },
            },
            None => GateDecision {
                verdict: Verdict::Unrated,
                disposition: match self.policy.unrated {
                    UnratedPolicy::AcceptWithoutReview => Disposition::UploadWithoutReview,
                    UnratedPolicy::Drop => Disposition::Drop,
                },
            },
        }
    }
}

/// 取出评分：数字或数字字符串，其它一律视为无评分
pub fn extract_rating(review: &ReviewDraft) -> Option<f64> {
    RATING_KEYS
        .iter()
        .filter_map(|key| review.get(*key))
        .find_map(numeric_value)
}

fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review(value: Value) -> ReviewDraft {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let gate = AppropriatenessGate::default();
        let decision = gate.evaluate(Some(&review(json!({"rating": 5}))));
        assert_eq!(decision.verdict, Verdict::Accepted { rating: 5.0 });
        assert_eq!(decision.disposition, Disposition::UploadWithReview);
    }

    #[test]
    fn test_below_threshold() {
        let gate = AppropriatenessGate::default();
        let decision = gate.evaluate(Some(&review(json!({"rating": 4}))));
        assert_eq!(decision.verdict, Verdict::BelowThreshold { rating: 4.0 });
        assert_eq!(decision.disposition, Disposition::UploadWithoutReview);

        let strict = AppropriatenessGate::new(GatePolicy {
            below_threshold: BelowThresholdPolicy::Drop,
            ..Default::default()
        });
        assert_eq!(
            strict.evaluate(Some(&review(json!({"rating": 4})))).disposition,
            Disposition::Drop
        );
    }

    #[test]
    fn test_missing_review_uses_default_disposition() {
        let gate = AppropriatenessGate::default();
        let decision = gate.evaluate(None);
        assert_eq!(decision.verdict, Verdict::Unrated);
        assert_eq!(decision.disposition, Disposition::UploadWithoutReview);

        let dropping = AppropriatenessGate::new(GatePolicy {
            unrated: UnratedPolicy::Drop,
            ..Default::default()
        });
        assert_eq!(dropping.evaluate(None).disposition, Disposition::Drop);
    }

    #[test]
    fn test_non_numeric_rating_is_unrated() {
        let gate = AppropriatenessGate::default();
        for value in [json!({"rating": null}), json!({"rating": "great"}), json!({"rating": [7]}), json!({})] {
            assert_eq!(gate.evaluate(Some(&review(value))).verdict, Verdict::Unrated);
        }
    }

    #[test]
    fn test_rating_fallbacks() {
        assert_eq!(extract_rating(&review(json!({"rating": " 7 "}))), Some(7.0));
        assert_eq!(extract_rating(&review(json!({"overall_score": 6}))), Some(6.0));
        // rating 无效时继续看 overall_score
        assert_eq!(
            extract_rating(&review(json!({"rating": "n/a", "overall_score": 8}))),
            Some(8.0)
        );
        assert_eq!(extract_rating(&review(json!({"rating": 4.5}))), Some(4.5));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("drop".parse::<UnratedPolicy>().unwrap(), UnratedPolicy::Drop);
        assert_eq!(
            "Accept_Without_Review".parse::<UnratedPolicy>().unwrap(),
            UnratedPolicy::AcceptWithoutReview
        );
        assert_eq!(
            "upload_metadata".parse::<BelowThresholdPolicy>().unwrap(),
            BelowThresholdPolicy::UploadMetadata
        );
        assert!("sometimes".parse::<BelowThresholdPolicy>().is_err());
    }
}
