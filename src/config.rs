use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::services::appropriateness_gate::{BelowThresholdPolicy, GatePolicy, UnratedPolicy};

/// 抓取模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CrawlMode {
    /// 最新论文（MAX_RESULTS_LATEST 篇）
    Latest,
    /// 定时任务（MAX_RESULTS_SCHEDULED 篇）
    Scheduled,
}

impl std::fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrawlMode::Latest => write!(f, "latest"),
            CrawlMode::Scheduled => write!(f, "scheduled"),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 凭证 ---
    pub crawler_secret_key: String,
    pub openai_api_key: String,
    // --- LLM 配置 ---
    pub openai_api_base: String,
    pub reviewer_model: String,
    /// 反思轮数 N
    pub reviewer_reflection: usize,
    pub reviewer_max_tokens: u32,
    /// 限流/超时时的重试次数
    pub completion_retries: usize,
    pub completion_retry_backoff_secs: f64,
    // --- 后端 ---
    pub backend_server_url: String,
    // --- arXiv ---
    pub arxiv_api_url: String,
    pub arxiv_query: String,
    pub arxiv_max_retries: usize,
    pub arxiv_initial_delay_secs: f64,
    pub max_results_latest: usize,
    pub max_results_scheduled: usize,
    // --- PDF ---
    /// 送入模型的最大字符数，超出部分直接截断
    pub max_pdf_text_length: usize,
    // --- 超时（秒） ---
    pub pdf_download_timeout_secs: u64,
    pub ai_server_timeout_secs: u64,
    pub backend_timeout_secs: u64,
    pub arxiv_timeout_secs: u64,
    /// 两篇论文之间的间隔（秒）
    pub request_delay_secs: f64,
    // --- 适当性判定 ---
    pub rating_threshold: i64,
    pub unrated_policy: UnratedPolicy,
    pub below_threshold_policy: BelowThresholdPolicy,
    // --- 其它 ---
    pub processed_papers_file: String,
    pub prompts_file: Option<String>,
    pub crawl_interval_secs: u64,
    pub log_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler_secret_key: String::new(),
            openai_api_key: String::new(),
            openai_api_base: "https://api.openai.com/v1".to_string(),
            reviewer_model: "gpt-4o-mini".to_string(),
            reviewer_reflection: 1,
            reviewer_max_tokens: 4096,
            completion_retries: 2,
            completion_retry_backoff_secs: 2.0,
            backend_server_url: "http://localhost:8000".to_string(),
            arxiv_api_url: "https://export.arxiv.org/api/query".to_string(),
            arxiv_query: "cat:cs.AI OR cat:cs.LG OR cat:cs.CV".to_string(),
            arxiv_max_retries: 3,
            arxiv_initial_delay_secs: 3.0,
            max_results_latest: 100,
            max_results_scheduled: 10,
            max_pdf_text_length: 100_000,
            pdf_download_timeout_secs: 30,
            ai_server_timeout_secs: 120,
            backend_timeout_secs: 60,
            arxiv_timeout_secs: 30,
            request_delay_secs: 1.0,
            rating_threshold: 5,
            unrated_policy: UnratedPolicy::AcceptWithoutReview,
            below_threshold_policy: BelowThresholdPolicy::UploadMetadata,
            processed_papers_file: "processed_papers.json".to_string(),
            prompts_file: None,
            crawl_interval_secs: 60,
            log_dir: "logs".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量读取配置（调用前应先加载 .env）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源读取配置，未设置的变量使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let text = |name: &str, default: String| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };

        Ok(Self {
            crawler_secret_key: text("CRAWLER_SECRET_KEY", d.crawler_secret_key),
            openai_api_key: text("OPENAI_API_KEY", d.openai_api_key),
            openai_api_base: text("OPENAI_API_BASE", d.openai_api_base),
            reviewer_model: text("REVIEWER_MODEL", d.reviewer_model),
            reviewer_reflection: parse_var(&lookup, "REVIEWER_REFLECTION", d.reviewer_reflection)?,
            reviewer_max_tokens: parse_var(&lookup, "REVIEWER_MAX_TOKENS", d.reviewer_max_tokens)?,
            completion_retries: parse_var(&lookup, "COMPLETION_RETRIES", d.completion_retries)?,
            completion_retry_backoff_secs: seconds_var(
                &lookup,
                "COMPLETION_RETRY_BACKOFF",
                d.completion_retry_backoff_secs,
            )?,
            backend_server_url: text("BACKEND_SERVER_URL", d.backend_server_url),
            arxiv_api_url: text("ARXIV_API_URL", d.arxiv_api_url),
            arxiv_query: text("ARXIV_QUERY", d.arxiv_query),
            arxiv_max_retries: parse_var(&lookup, "ARXIV_MAX_RETRIES", d.arxiv_max_retries)?,
            arxiv_initial_delay_secs: seconds_var(
                &lookup,
                "ARXIV_INITIAL_DELAY",
                d.arxiv_initial_delay_secs,
            )?,
            max_results_latest: parse_var(&lookup, "MAX_RESULTS_LATEST", d.max_results_latest)?,
            max_results_scheduled: parse_var(
                &lookup,
                "MAX_RESULTS_SCHEDULED",
                d.max_results_scheduled,
            )?,
            max_pdf_text_length: parse_var(&lookup, "MAX_PDF_TEXT_LENGTH", d.max_pdf_text_length)?,
            pdf_download_timeout_secs: parse_var(
                &lookup,
                "PDF_DOWNLOAD_TIMEOUT",
                d.pdf_download_timeout_secs,
            )?,
            ai_server_timeout_secs: parse_var(&lookup, "AI_SERVER_TIMEOUT", d.ai_server_timeout_secs)?,
            backend_timeout_secs: parse_var(&lookup, "BACKEND_TIMEOUT", d.backend_timeout_secs)?,
            arxiv_timeout_secs: parse_var(&lookup, "ARXIV_TIMEOUT", d.arxiv_timeout_secs)?,
            request_delay_secs: seconds_var(&lookup, "REQUEST_DELAY", d.request_delay_secs)?,
            rating_threshold: parse_var(&lookup, "RATING_THRESHOLD", d.rating_threshold)?,
            unrated_policy: parse_var(&lookup, "UNRATED_POLICY", d.unrated_policy)?,
            below_threshold_policy: parse_var(
                &lookup,
                "BELOW_THRESHOLD_POLICY",
                d.below_threshold_policy,
            )?,
            processed_papers_file: text("PROCESSED_PAPERS_FILE", d.processed_papers_file),
            prompts_file: lookup("PROMPTS_FILE").filter(|p| !p.trim().is_empty()),
            crawl_interval_secs: parse_var(&lookup, "CRAWL_INTERVAL_SECS", d.crawl_interval_secs)?,
            log_dir: text("LOG_DIR", d.log_dir),
        })
    }

    /// 校验必填项
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crawler_secret_key.trim().is_empty() {
            return Err(ConfigError::MissingVar {
                var_name: "CRAWLER_SECRET_KEY".to_string(),
            });
        }
        if self.openai_api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar {
                var_name: "OPENAI_API_KEY".to_string(),
            });
        }
        Ok(())
    }

    /// 指定模式下每批抓取的论文数
    pub fn max_results(&self, mode: CrawlMode) -> usize {
        match mode {
            CrawlMode::Latest => self.max_results_latest,
            CrawlMode::Scheduled => self.max_results_scheduled,
        }
    }

    pub fn gate_policy(&self) -> GatePolicy {
        GatePolicy {
            threshold: self.rating_threshold,
            unrated: self.unrated_policy,
            below_threshold: self.below_threshold_policy,
        }
    }

    pub fn request_delay(&self) -> Duration {
        secs_f64(self.request_delay_secs)
    }

    pub fn completion_retry_backoff(&self) -> Duration {
        secs_f64(self.completion_retry_backoff_secs)
    }

    pub fn arxiv_initial_delay(&self) -> Duration {
        secs_f64(self.arxiv_initial_delay_secs)
    }

    pub fn crawl_interval(&self) -> Duration {
        Duration::from_secs(self.crawl_interval_secs)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var_name: name.to_string(),
            value: raw,
            expected: std::any::type_name::<T>().to_string(),
        }),
    }
}

/// 秒数变量：必须能表示为 `Duration`，负数按 0 处理
fn seconds_var<F>(lookup: &F, name: &str, default: f64) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: f64 = parse_var(lookup, name, default)?;
    if secs.is_nan() || Duration::try_from_secs_f64(secs.max(0.0)).is_err() {
        return Err(ConfigError::InvalidValue {
            var_name: name.to_string(),
            value: secs.to_string(),
            expected: "seconds".to_string(),
        });
    }
    Ok(secs)
}

fn secs_f64(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
