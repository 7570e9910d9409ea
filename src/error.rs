//! 错误类型
//!
//! 每个外部协作者一个错误枚举，`AppError` 统一包装。
//! 单个阶段失败（StageFailure）和整体降级（PipelineDegraded）不是错误，
//! 它们记录在 `StageReport` 里，不会向上传播。

use thiserror::Error;

/// 结构化输出解析错误
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// 三种解析方式都失败，携带原始文本用于诊断
    #[error("模型输出不是合法的 JSON 对象 (长度: {} 字符)", raw.chars().count())]
    MalformedOutput { raw: String },
}

/// 补全服务（LLM）错误
///
/// 三种错误在阶段层面都只会导致重试或跳过，绝不会终止进程。
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// 请求频率限制
    #[error("LLM 请求频率限制 (模型: {model}): {message}")]
    RateLimited { model: String, message: String },
    /// 调用超时
    #[error("LLM 调用超时 (模型: {model}, {secs} 秒)")]
    Timeout { model: String, secs: u64 },
    /// 其它服务端错误
    #[error("LLM 服务错误 (模型: {model}): {message}")]
    ServiceError { model: String, message: String },
}

impl CompletionError {
    /// 是否值得重试（限流和超时）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited { .. } | CompletionError::Timeout { .. }
        )
    }
}

/// PDF 下载与文本提取错误
#[derive(Debug, Clone, Error)]
pub enum PdfError {
    /// 网络或 HTTP 错误
    #[error("PDF 下载失败 ({url}): {message}")]
    Download { url: String, message: String },
    /// 文本提取失败
    #[error("PDF 文本提取失败: {message}")]
    Extraction { message: String },
}

/// 论文元数据获取错误
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("arXiv 请求失败 ({endpoint}): {message}")]
    Request { endpoint: String, message: String },
    #[error("arXiv 返回错误状态 ({endpoint}): HTTP {status}")]
    BadStatus { endpoint: String, status: u16 },
    #[error("arXiv Atom 响应解析失败: {message}")]
    Decode { message: String },
}

/// 上传服务错误
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// 凭证无效，整个批次终止
    #[error("上传认证失败 (HTTP {status})，凭证对本次运行无效")]
    Auth { status: u16 },
    /// 网络错误，下一批次重试
    #[error("上传网络错误: {message}")]
    Network { message: String },
    /// 上传超时
    #[error("上传超时: {message}")]
    Timeout { message: String },
    /// 后端限流
    #[error("上传被限流 (HTTP 429)")]
    RateLimited,
    /// 后端 5xx
    #[error("后端服务错误 (HTTP {status}): {body}")]
    ServiceError { status: u16, body: String },
    /// 后端拒绝该论文（其它 4xx），重试无意义
    #[error("后端拒绝上传 (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

impl UploadError {
    /// 致命错误：立即终止批次
    pub fn is_fatal(&self) -> bool {
        matches!(self, UploadError::Auth { .. })
    }

    /// 可重试错误：不写入去重账本，下一批次重新处理
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UploadError::Network { .. }
                | UploadError::Timeout { .. }
                | UploadError::RateLimited
                | UploadError::ServiceError { .. }
        )
    }
}

/// 去重账本错误
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("读取去重账本失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入去重账本失败 ({path}): {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("序列化去重账本失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// 必填环境变量缺失
    #[error("环境变量 {var_name} 未设置，请检查 .env 文件")]
    MissingVar { var_name: String },
    /// 取值非法
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected}")]
    InvalidValue {
        var_name: String,
        value: String,
        expected: String,
    },
    /// 提示词文件读取或解析失败
    #[error("提示词文件加载失败 ({path}): {message}")]
    Prompts { path: String, message: String },
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    #[error("获取论文失败: {0}")]
    Fetch(#[from] FetchError),
    #[error("上传错误: {0}")]
    Upload(#[from] UploadError),
    #[error("账本错误: {0}")]
    Ledger(#[from] LedgerError),
    #[error("初始化失败: {0}")]
    Init(String),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
