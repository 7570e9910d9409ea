/// 后端上传客户端
///
/// 以 multipart 表单把论文元数据、评审和 PDF 提交到后端
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::UploadError;
use crate::models::{ReviewDraft, UploadFields};

const UPLOAD_PATH: &str = "/api/crawler/papers";

/// 上传服务
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(
        &self,
        fields: &UploadFields,
        review: Option<&ReviewDraft>,
        pdf: Option<&[u8]>,
    ) -> Result<(), UploadError>;
}

/// 后端客户端
pub struct BackendClient {
    client: reqwest::Client,
    endpoint: String,
    secret_key: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_secs))
            .build()
            .map_err(|e| UploadError::Network {
                message: format!("无法创建 HTTP 客户端: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}{}",
                config.backend_server_url.trim_end_matches('/'),
                UPLOAD_PATH
            ),
            secret_key: config.crawler_secret_key.clone(),
        })
    }

    fn build_form(
        fields: &UploadFields,
        review: Option<&ReviewDraft>,
        pdf: Option<&[u8]>,
    ) -> Result<Form, UploadError> {
        let mut form = Form::new();
        for (key, value) in fields.form_pairs() {
            form = form.text(key, value);
        }
        form = form.text("content", content_field(review).to_string());

        if let Some(bytes) = pdf {
            let part = Part::bytes(bytes.to_vec())
                .file_name(format!("{}.pdf", fields.paper_id))
                .mime_str("application/pdf")
                .map_err(|e| UploadError::Network {
                    message: e.to_string(),
                })?;
            form = form.part("pdf", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl UploadService for BackendClient {
    async fn upload(
        &self,
        fields: &UploadFields,
        review: Option<&ReviewDraft>,
        pdf: Option<&[u8]>,
    ) -> Result<(), UploadError> {
        debug!(
            "上传论文 {} (评审: {}, PDF: {})",
            fields.paper_id,
            review.is_some(),
            pdf.map(|b| b.len()).unwrap_or(0)
        );

        let form = Self::build_form(fields, review, pdf)?;
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.secret_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UploadError::Timeout {
                        message: e.to_string(),
                    }
                } else {
                    UploadError::Network {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, body))
    }
}

/// `content` 字段：有评审时为 `{"review": ...}`，否则 `{}`
pub fn content_field(review: Option<&ReviewDraft>) -> Value {
    match review {
        Some(review) => json!({ "review": review }),
        None => json!({}),
    }
}

fn classify_status(status: StatusCode, body: String) -> UploadError {
    let code = status.as_u16();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UploadError::Auth { status: code },
        StatusCode::TOO_MANY_REQUESTS => UploadError::RateLimited,
        s if s.is_server_error() => UploadError::ServiceError { status: code, body },
        _ => UploadError::Rejected { status: code, body },
    }
}
