//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批次调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量处理器
//! - 管理应用生命周期（初始化、运行）
//! - 获取论文（Vec<PaperRecord>）并去重
//! - 逐篇串行处理，两篇之间固定间隔
//! - 每篇结束后写入去重账本
//! - 输出批次统计信息
//!
//! ### `paper_processor` - 单篇论文处理器
//! - PDF 下载与文本提取
//! - 委托 ReviewFlow 生成评审
//! - 适当性判定
//! - 上传并归类结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PaperRecord>)
//!     ↓
//! paper_processor (处理单篇 PaperRecord)
//!     ↓
//! workflow::ReviewFlow (INITIAL → REFLECT×N → ENSEMBLE)
//!     ↓
//! services (能力层：llm / parser / gate / ledger)
//!     ↓
//! clients (外部协作者：arXiv / PDF / 后端)
//! ```

pub mod batch_processor;
pub mod paper_processor;

// 重新导出主要类型
pub use batch_processor::{App, BatchStats, CrawlBatch, RunOptions};
pub use paper_processor::{PaperOutcome, PaperProcessor};
