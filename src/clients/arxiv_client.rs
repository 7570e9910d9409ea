/// arXiv API 客户端
///
/// 查询 Atom 接口，返回按提交时间排序的论文元数据（不含 PDF 字节）
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::models::PaperRecord;

const USER_AGENT: &str = "arxiv-review-crawler/0.1";

/// 排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

impl SortKey {
    pub fn as_api_str(&self) -> &str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::LastUpdatedDate => "lastUpdatedDate",
            SortKey::SubmittedDate => "submittedDate",
        }
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_api_str(&self) -> &str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// 论文来源
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn fetch(
        &self,
        max_results: usize,
        sort_key: SortKey,
        sort_order: SortOrder,
    ) -> Result<Vec<PaperRecord>, FetchError>;
}

/// arXiv 客户端
pub struct ArxivClient {
    client: reqwest::Client,
    api_url: String,
    query: String,
    max_retries: usize,
    initial_delay: Duration,
}

impl ArxivClient {
    /// 创建新的 arXiv 客户端
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.arxiv_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Request {
                endpoint: config.arxiv_api_url.clone(),
                message: format!("无法创建 HTTP 客户端: {}", e),
            })?;

        Ok(Self {
            client,
            api_url: config.arxiv_api_url.clone(),
            query: config.arxiv_query.clone(),
            max_retries: config.arxiv_max_retries,
            initial_delay: config.arxiv_initial_delay(),
        })
    }

    /// 发送一次查询请求，返回响应正文
    async fn request_once(
        &self,
        max_results: usize,
        sort_key: SortKey,
        sort_order: SortOrder,
    ) -> Result<String, FetchError> {
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("search_query", self.query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", sort_key.as_api_str()),
                ("sortOrder", sort_order.as_api_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Request {
                endpoint: self.api_url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                endpoint: self.api_url.clone(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Request {
            endpoint: self.api_url.clone(),
            message: format!("读取响应失败: {}", e),
        })
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn fetch(
        &self,
        max_results: usize,
        sort_key: SortKey,
        sort_order: SortOrder,
    ) -> Result<Vec<PaperRecord>, FetchError> {
        info!("🔍 查询 arXiv: {} (最多 {} 篇)", self.query, max_results);

        let mut delay = self.initial_delay;
        let mut attempt = 0;
        let body = loop {
            match self.request_once(max_results, sort_key, sort_order).await {
                Ok(body) => break body,
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    warn!(
                        "arXiv 请求失败，{:.1} 秒后第 {}/{} 次重试: {}",
                        delay.as_secs_f64(),
                        attempt,
                        self.max_retries,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        };

        let papers = parse_atom_feed(&body)?;
        info!("✓ arXiv 返回 {} 篇论文", papers.len());
        Ok(papers)
    }
}

fn is_retryable(err: &FetchError) -> bool {
    match err {
        FetchError::Request { .. } => true,
        FetchError::BadStatus { status, .. } => *status == 429 || *status >= 500,
        FetchError::Decode { .. } => false,
    }
}

// ========== Atom 解析 ==========

/// 当前正在读取文本的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    AuthorName,
    Doi,
}

#[derive(Debug, Default)]
struct EntryBuilder {
    id_url: String,
    title: String,
    summary: String,
    published: String,
    authors: Vec<String>,
    categories: Vec<String>,
    abs_url: Option<String>,
    pdf_url: Option<String>,
    doi: Option<String>,
    in_author: bool,
}

impl EntryBuilder {
    fn push_text(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Id => &mut self.id_url,
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Published => &mut self.published,
            Field::AuthorName => match self.authors.last_mut() {
                Some(name) => name,
                None => return,
            },
            Field::Doi => self.doi.get_or_insert_with(String::new),
        };
        target.push_str(text);
    }

    fn read_link(&mut self, tag: &BytesStart<'_>) {
        let mut href = None;
        let mut title = None;
        let mut rel = None;
        for attr in tag.attributes().flatten() {
            let value = attr
                .unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_default();
            match attr.key.as_ref() {
                b"href" => href = Some(value),
                b"title" => title = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }

        let Some(href) = href else { return };
        if title.as_deref() == Some("pdf") {
            self.pdf_url = Some(href);
        } else if rel.as_deref() == Some("alternate") {
            self.abs_url = Some(href);
        }
    }

    fn read_category(&mut self, tag: &BytesStart<'_>) {
        for attr in tag.attributes().flatten() {
            if attr.key.as_ref() == b"term" {
                if let Ok(term) = attr.unescape_value() {
                    let term = term.trim().to_string();
                    if !term.is_empty() && !self.categories.contains(&term) {
                        self.categories.push(term);
                    }
                }
            }
        }
    }

    fn build(self) -> Option<PaperRecord> {
        let id_url = self.id_url.trim().to_string();
        if id_url.is_empty() || id_url.contains("/api/errors") {
            warn!("跳过 arXiv 错误条目: {} {}", id_url, normalize_whitespace(&self.summary));
            return None;
        }

        let id = extract_arxiv_id(&id_url);
        let published = match DateTime::parse_from_rfc3339(self.published.trim()) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                warn!("跳过论文 {}: 发布时间无法解析 ({})", id, e);
                return None;
            }
        };

        let url = self.abs_url.unwrap_or_else(|| id_url.clone());
        let pdf_url = self.pdf_url.unwrap_or_else(|| derive_pdf_url(&url));

        Some(PaperRecord {
            id,
            title: normalize_whitespace(&self.title),
            authors: self
                .authors
                .iter()
                .map(|a| normalize_whitespace(a))
                .filter(|a| !a.is_empty())
                .collect(),
            categories: self.categories,
            summary: normalize_whitespace(&self.summary),
            published,
            url,
            pdf_url,
            doi: self
                .doi
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }
}

/// 解析 arXiv Atom 响应
pub fn parse_atom_feed(xml: &str) -> Result<Vec<PaperRecord>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut papers = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match (e.name().as_ref(), entry.as_mut()) {
                (b"entry", _) => entry = Some(EntryBuilder::default()),
                (b"id", Some(_)) => field = Some(Field::Id),
                (b"title", Some(_)) => field = Some(Field::Title),
                (b"summary", Some(_)) => field = Some(Field::Summary),
                (b"published", Some(_)) => field = Some(Field::Published),
                (b"arxiv:doi", Some(_)) => field = Some(Field::Doi),
                (b"author", Some(current)) => current.in_author = true,
                (b"name", Some(current)) if current.in_author => {
                    current.authors.push(String::new());
                    field = Some(Field::AuthorName);
                }
                (b"link", Some(current)) => current.read_link(&e),
                (b"category", Some(current)) => current.read_category(&e),
                _ => {}
            },
            Ok(Event::Empty(e)) => match (e.name().as_ref(), entry.as_mut()) {
                (b"link", Some(current)) => current.read_link(&e),
                (b"category", Some(current)) => current.read_category(&e),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let (Some(current), Some(f)) = (entry.as_mut(), field) {
                    let text = e.unescape().map_err(|err| FetchError::Decode {
                        message: err.to_string(),
                    })?;
                    current.push_text(f, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(current), Some(f)) = (entry.as_mut(), field) {
                    current.push_text(f, &String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"entry" => {
                    if let Some(paper) = entry.take().and_then(EntryBuilder::build) {
                        papers.push(paper);
                    }
                    field = None;
                }
                b"author" => {
                    if let Some(current) = entry.as_mut() {
                        current.in_author = false;
                    }
                }
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FetchError::Decode {
                    message: format!("位置 {}: {}", reader.buffer_position(), e),
                })
            }
            _ => {}
        }
    }

    debug!("Atom 解析完成: {} 篇", papers.len());
    Ok(papers)
}

/// `http://arxiv.org/abs/2401.01234v1` -> `2401.01234v1`
fn extract_arxiv_id(url: &str) -> String {
    match url.split_once("/abs/") {
        Some((_, id)) => id.trim_matches('/').to_string(),
        None => url.rsplit('/').next().unwrap_or(url).to_string(),
    }
}

/// 摘要页 URL 推导 PDF 地址
fn derive_pdf_url(abs_url: &str) -> String {
    let pdf = abs_url.replacen("/abs/", "/pdf/", 1);
    if pdf.ends_with(".pdf") {
        pdf
    } else {
        format!("{}.pdf", pdf)
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
