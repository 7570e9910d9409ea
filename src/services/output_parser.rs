//! 结构化输出解析 - 业务能力层
//!
//! 把模型的原始文本回复转换为 JSON 对象。依次尝试，先成功者胜出：
//! 1. 整段（去首尾空白）直接解析
//! 2. 提取 ```json ... ``` 或 ``` ... ``` 代码块内容
//! 3. 按括号深度找到第一个完整的 `{ ... }`
//!
//! 纯函数，无副作用，同样的输入总是得到同样的输出。
//! 不尝试修复非法 JSON。

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ParseError;
use crate::models::review::ReviewDraft;

fn fenced_block_regex() -> &'static Regex {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    FENCED.get_or_init(|| {
        Regex::new(r"(?is)```[ \t]*(?:json)?[ \t]*\r?\n?(.*?)```").expect("fenced block pattern")
    })
}

/// 解析模型回复
pub fn parse_review_output(text: &str) -> Result<ReviewDraft, ParseError> {
    let trimmed = text.trim();

    // 1. 直接解析
    if let Some(map) = parse_object(trimmed) {
        return Ok(map);
    }

    // 2. 代码块
    for captures in fenced_block_regex().captures_iter(trimmed) {
        if let Some(inner) = captures.get(1) {
            if let Some(map) = parse_object(inner.as_str().trim()) {
                return Ok(map);
            }
        }
    }

    // 3. 括号深度扫描，退而求其次取第一个 `{` 到最后一个 `}`
    if let Some(candidate) = balanced_object_span(trimmed) {
        if let Some(map) = parse_object(candidate) {
            return Ok(map);
        }
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(map) = parse_object(&trimmed[start..=end]) {
                return Ok(map);
            }
        }
    }

    Err(ParseError::MalformedOutput {
        raw: text.to_string(),
    })
}

fn parse_object(candidate: &str) -> Option<ReviewDraft> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// 从第一个 `{` 开始，跟踪字符串和转义，返回深度回到 0 时的完整片段
fn balanced_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
