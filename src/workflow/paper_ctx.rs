//! 论文处理上下文
//!
//! 封装"我正在处理这一批的第几篇论文"这一信息

use std::fmt::Display;

/// 论文处理上下文
#[derive(Debug, Clone)]
pub struct PaperCtx {
    /// arXiv 标识
    pub paper_id: String,

    /// 在本批中的序号（从1开始）
    pub index: usize,

    /// 本批待处理总数
    pub total: usize,
}

impl PaperCtx {
    pub fn new(paper_id: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            paper_id: paper_id.into(),
            index,
            total,
        }
    }
}

impl Display for PaperCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[论文 {}/{} #{}]", self.index, self.total, self.paper_id)
    }
}
