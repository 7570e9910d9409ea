/// PDF 客户端
///
/// 下载论文 PDF 并提取纯文本
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::PdfError;

/// PDF 获取服务
#[async_trait]
pub trait PdfService: Send + Sync {
    /// 下载 PDF 原始字节
    async fn download(&self, url: &str) -> Result<Vec<u8>, PdfError>;

    /// 从 PDF 字节中提取文本
    async fn extract_text(&self, bytes: &[u8]) -> Result<String, PdfError>;
}

/// PDF 客户端
pub struct PdfClient {
    client: reqwest::Client,
}

impl PdfClient {
    pub fn new(config: &Config) -> Result<Self, PdfError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.pdf_download_timeout_secs))
            .build()
            .map_err(|e| PdfError::Download {
                url: String::new(),
                message: format!("无法创建 HTTP 客户端: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PdfService for PdfClient {
    async fn download(&self, url: &str) -> Result<Vec<u8>, PdfError> {
        debug!("下载 PDF: {}", url);
        let download_err = |message: String| PdfError::Download {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_err(format!("HTTP {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_err(e.to_string()))?;
        debug!("PDF 下载完成: {} 字节", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn extract_text(&self, bytes: &[u8]) -> Result<String, PdfError> {
        let owned = bytes.to_vec();
        // pdf-extract 是同步 CPU 密集操作，遇到畸形文件可能 panic
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned))
            .await
            .map_err(|e| PdfError::Extraction {
                message: format!("提取线程异常退出: {}", e),
            })?
            .map_err(|e| PdfError::Extraction {
                message: e.to_string(),
            })
    }
}
