//! 论文数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::category::category_name;

/// 一篇候选论文的元数据
///
/// 抓取后不可变；PDF 字节不在这里保存，只在单次处理过程中临时持有。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// arXiv 标识（如 `2401.01234v1`），同一来源内全局唯一
    pub id: String,
    pub title: String,
    /// 作者（有序）
    pub authors: Vec<String>,
    /// 分类代码（去重，保持来源顺序）
    pub categories: Vec<String>,
    /// 摘要
    pub summary: String,
    pub published: DateTime<Utc>,
    /// 摘要页 URL
    pub url: String,
    pub pdf_url: String,
    pub doi: Option<String>,
}

impl PaperRecord {
    /// 规范化后的 DOI：有 DOI 时为 `https://doi.org/...`，否则 `arXiv:<id>`
    pub fn doi_link(&self) -> String {
        match self.doi.as_deref().map(str::trim) {
            Some(doi) if !doi.is_empty() => {
                if doi.starts_with("http") {
                    doi.to_string()
                } else {
                    format!("https://doi.org/{}", doi)
                }
            }
            _ => format!("arXiv:{}", self.id),
        }
    }

    /// 构建上传到后端的表单字段
    pub fn upload_fields(&self) -> UploadFields {
        let categories: Vec<&str> = self.categories.iter().map(|c| category_name(c)).collect();

        UploadFields {
            paper_id: self.id.clone(),
            title: self.title.clone(),
            categories: serde_json::to_string(&categories).unwrap_or_else(|_| "[]".to_string()),
            authors: serde_json::to_string(&self.authors).unwrap_or_else(|_| "[]".to_string()),
            summary: self.summary.clone(),
            doi: self.doi_link(),
            url: self.url.clone(),
            issued_at: self.published.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

/// 上传表单中的元数据字段
///
/// `categories` 和 `authors` 是 JSON 数组字符串，与后端约定一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFields {
    pub paper_id: String,
    pub title: String,
    pub categories: String,
    pub authors: String,
    pub summary: String,
    pub doi: String,
    pub url: String,
    pub issued_at: String,
}

impl UploadFields {
    /// 按后端字段名展开，跳过空值
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("paperId", &self.paper_id),
            ("title", &self.title),
            ("categories", &self.categories),
            ("authors", &self.authors),
            ("summary", &self.summary),
            ("doi", &self.doi),
            ("url", &self.url),
            ("issuedAt", &self.issued_at),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key, value.clone()))
        .collect()
    }
}
