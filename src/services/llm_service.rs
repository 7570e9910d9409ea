//! LLM 服务 - 业务能力层
//!
//! 只负责"一次补全"能力，不关心评审流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::CompletionError;

/// 补全服务
///
/// 评审流程只依赖这个 trait，测试中可以替换为脚本化实现。
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// 发送一次补全请求，返回模型的原始文本回复
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, CompletionError>;
}

/// LLM 服务
///
/// 职责：
/// - 调用 OpenAI 兼容的 Chat Completion API
/// - 每次调用有独立的超时
/// - 把底层错误归类为 限流 / 超时 / 服务错误
/// - 不关心提示词内容和阶段顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_tokens: u32,
    timeout: Duration,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_api_base);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.reviewer_model.clone(),
            max_tokens: config.reviewer_max_tokens,
            timeout: Duration::from_secs(config.ai_server_timeout_secs),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（空字符串表示不发送）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（去除首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: &str,
    ) -> Result<String, CompletionError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let request = self
            .build_request(user_message, system_message)
            .map_err(|e| self.classify(e))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                warn!("LLM API 调用超时 ({} 秒)", self.timeout.as_secs());
                CompletionError::Timeout {
                    model: self.model_name.clone(),
                    secs: self.timeout.as_secs(),
                }
            })?
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                self.classify(e)
            })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| CompletionError::ServiceError {
                model: self.model_name.clone(),
                message: "LLM 返回内容为空".to_string(),
            })?;

        Ok(content.trim().to_string())
    }

    fn build_request(
        &self,
        user_message: &str,
        system_message: &str,
    ) -> Result<async_openai::types::chat::CreateChatCompletionRequest, OpenAIError> {
        let mut messages = Vec::new();

        if !system_message.is_empty() {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(system_message)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .max_tokens(self.max_tokens)
            .build()
    }

    fn classify(&self, err: OpenAIError) -> CompletionError {
        classify_error(&self.model_name, &err.to_string())
    }
}

#[async_trait]
impl CompletionService for LlmService {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, CompletionError> {
        self.send_to_llm(prompt, system).await
    }
}

/// 按错误信息归类：限流单独识别，其余都是服务错误
fn classify_error(model: &str, message: &str) -> CompletionError {
    let lowered = message.to_lowercase();
    if lowered.contains("rate limit")
        || lowered.contains("rate_limit")
        || lowered.contains("too many requests")
        || lowered.contains("429")
    {
        CompletionError::RateLimited {
            model: model.to_string(),
            message: message.to_string(),
        }
    } else {
        CompletionError::ServiceError {
            model: model.to_string(),
            message: message.to_string(),
        }
    }
}
