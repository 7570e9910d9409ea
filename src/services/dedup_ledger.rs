//! 去重账本 - 业务能力层
//!
//! 已处理论文 ID 的持久化集合。文件格式：
//!
//! ```json
//! {"paper_ids": ["2401.00001v1", ...], "last_updated": "2024-01-01T00:00:00+00:00"}
//! ```
//!
//! 每次 `record` 都同步落盘（先写临时文件再 rename），
//! 崩溃后最多重新处理正在处理中的那一篇。

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LedgerError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    paper_ids: Vec<String>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// 去重账本
///
/// 只有一个写入者（编排层），不需要加锁。
#[derive(Debug)]
pub struct DedupLedger {
    path: PathBuf,
    ids: HashSet<String>,
}

impl DedupLedger {
    /// 打开账本，文件不存在时从空集合开始
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let ids = Self::load(&path)?;
        debug!("去重账本已加载: {} ({} 条)", path.display(), ids.len());
        Ok(Self { path, ids })
    }

    /// 读取已持久化的 ID 集合
    ///
    /// 文件内容损坏时记录警告并返回空集合，不阻止抓取。
    pub fn load(path: &Path) -> Result<HashSet<String>, LedgerError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(source) => {
                return Err(LedgerError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        match serde_json::from_str::<LedgerFile>(&content) {
            Ok(file) => Ok(file.paper_ids.into_iter().collect()),
            Err(e) => {
                warn!("⚠️ 去重账本格式错误，按空账本处理 ({}): {}", path.display(), e);
                Ok(HashSet::new())
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// 加入内存集合，返回是否为新 ID
    pub fn add(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    /// 同步写盘
    pub fn flush(&self) -> Result<(), LedgerError> {
        let mut paper_ids: Vec<&String> = self.ids.iter().collect();
        paper_ids.sort();

        let body = serde_json::to_string_pretty(&serde_json::json!({
            "paper_ids": paper_ids,
            "last_updated": Utc::now().to_rfc3339(),
        }))?;

        let write_err = |source: std::io::Error| LedgerError::Write {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path).map_err(write_err)?;
            file.write_all(body.as_bytes()).map_err(write_err)?;
            file.sync_all().map_err(write_err)?;
        }
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        Ok(())
    }

    /// 记录一篇已处理的论文并立即落盘
    pub fn record(&mut self, id: &str) -> Result<(), LedgerError> {
        self.add(id);
        self.flush()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
