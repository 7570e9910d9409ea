//! 评审提示词
//!
//! 内置一套默认提示词，可由 TOML 文件逐项覆盖（见 `loaders::load_prompt_set`）。

use serde::Deserialize;

use crate::models::review::ReviewDraft;

const DEFAULT_REVIEWER_SYSTEM: &str = "You are an AI researcher who is reviewing a paper that was submitted to a prestigious ML venue. \
Be critical and cautious in your decision. If a paper is bad or you are unsure, give it bad scores and reject it.";

const DEFAULT_REVIEW_TEMPLATE: &str = r#"## Review Form
Below is a description of the questions you will be asked on the review form for each paper and some guidelines on what to consider when answering these questions.

{guidelines}

{few_shot_examples}

Here is the paper you are asked to review:
```
{paper}
```

Respond with a single JSON object and nothing else. Use these keys:
"summary", "strengths", "weaknesses", "questions", "limitations",
"soundness" (1-4), "presentation" (1-4), "contribution" (1-4),
"rating" (integer 1-10), "confidence" (1-5), "decision" ("Accept" or "Reject")."#;

const DEFAULT_REFLECTION_TEMPLATE: &str = r#"In your thoughts, first carefully consider the accuracy and soundness of the review you just created.
Include any other factors that you think are important in evaluating the paper.
Ensure the review is clear and concise, and the JSON is in the correct format.
Do not make things overly complicated.
In the next attempt, try and refine and improve your review.
Stick to the spirit of the original review unless there are glaring issues.

Reviewer guidelines:
{guidelines}

Your previous review:
```json
{previous_review}
```

Respond with the revised review as a single JSON object using the same keys.
If there is nothing to improve, repeat the previous JSON exactly and include "I am done" after it."#;

const DEFAULT_ENSEMBLE_SYSTEM: &str = "You are an Area Chair at a machine learning conference. \
You are in charge of meta-reviewing a paper that was reviewed by {reviewer_count} reviewers. \
Your job is to aggregate the reviews into a single meta-review in the same format. \
Be critical and cautious in your decision, find consensus, and respect the opinion of all the reviewers. \
Respond with a single JSON object using the same keys as the reviews.";

const DEFAULT_GUIDELINES: &str = r#"1. Summary: Briefly summarize the paper and its contributions.
2. Strengths and Weaknesses: Assess originality, quality, clarity and significance.
3. Questions: List questions and suggestions for the authors.
4. Limitations: Have the authors adequately addressed the limitations and potential negative societal impact?
5. Soundness, Presentation, Contribution: 4 excellent, 3 good, 2 fair, 1 poor.
6. Rating: 10 award quality, 8 strong accept, 7 accept, 6 weak accept, 5 borderline accept, 4 borderline reject, 3 reject, 2 strong reject, 1 very strong reject.
7. Confidence: 5 absolutely certain, 4 confident, 3 fairly confident, 2 willing to defend, 1 educated guess."#;

const DEFAULT_FEW_SHOT_EXAMPLES: &str = r#"Below is an example review:
{"summary": "The paper proposes a sparse attention variant and evaluates it on language modeling.", "strengths": ["Simple method", "Clear writing"], "weaknesses": ["Limited baselines"], "questions": ["How does it scale beyond 8k tokens?"], "limitations": "Discussed briefly.", "soundness": 3, "presentation": 3, "contribution": 2, "rating": 5, "confidence": 4, "decision": "Accept"}"#;

/// 评审各阶段使用的提示词
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptSet {
    pub reviewer_system: String,
    /// 占位符：`{guidelines}` `{few_shot_examples}` `{paper}`
    pub review_template: String,
    /// 占位符：`{guidelines}` `{previous_review}`
    pub reflection_template: String,
    /// 占位符：`{reviewer_count}`
    pub ensemble_system: String,
    pub guidelines: String,
    pub few_shot_examples: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            reviewer_system: DEFAULT_REVIEWER_SYSTEM.to_string(),
            review_template: DEFAULT_REVIEW_TEMPLATE.to_string(),
            reflection_template: DEFAULT_REFLECTION_TEMPLATE.to_string(),
            ensemble_system: DEFAULT_ENSEMBLE_SYSTEM.to_string(),
            guidelines: DEFAULT_GUIDELINES.to_string(),
            few_shot_examples: DEFAULT_FEW_SHOT_EXAMPLES.to_string(),
        }
    }
}

impl PromptSet {
    /// 初始评审的用户消息
    ///
    /// 论文文本最后替换，避免正文里的花括号被当作占位符。
    pub fn render_review(&self, paper_text: &str) -> String {
        self.review_template
            .replace("{guidelines}", &self.guidelines)
            .replace("{few_shot_examples}", &self.few_shot_examples)
            .replace("{paper}", paper_text)
    }

    /// 第 `round`（从 0 开始）轮反思的用户消息
    pub fn render_reflection(&self, round: usize, total: usize, previous: &ReviewDraft) -> String {
        let previous_json = serde_json::to_string_pretty(previous).unwrap_or_default();
        let body = self
            .reflection_template
            .replace("{guidelines}", &self.guidelines)
            .replace("{previous_review}", &previous_json);
        format!("Round {}/{}. {}", round + 1, total, body)
    }

    /// 集成阶段的系统消息
    pub fn render_ensemble_system(&self, reviewer_count: usize) -> String {
        self.ensemble_system
            .replace("{reviewer_count}", &reviewer_count.to_string())
    }

    /// 集成阶段的用户消息：逐条列出评审，最后附上评审指南
    pub fn render_ensemble(&self, drafts: &[&ReviewDraft]) -> String {
        let total = drafts.len();
        let mut prompt = String::new();
        for (idx, draft) in drafts.iter().enumerate() {
            let review_text = serde_json::to_string_pretty(draft).unwrap_or_default();
            prompt.push_str(&format!("Review {}/{}:\n{}\n\n", idx + 1, total, review_text));
        }
        prompt.push_str("\n\n\n\n\n");
        prompt.push_str(&self.guidelines);
        prompt
    }
}
