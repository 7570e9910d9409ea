//! # arXiv Review Crawler
//!
//! 抓取 arXiv 新论文，用大模型生成结构化评审，再把论文和评审提交到后端
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 外部协作者（Clients）
//! - `clients/` - 只做 I/O，没有内部状态机
//! - `ArxivClient` - 查询 Atom 接口
//! - `PdfClient` - 下载 PDF、提取文本
//! - `BackendClient` - multipart 上传
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单篇论文
//! - `LlmService` - 一次补全
//! - `output_parser` - 把模型回复解析为 JSON 对象
//! - `AppropriatenessGate` - 评分与阈值判定
//! - `DedupLedger` - 已处理论文的持久化集合
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇论文"的评审流程
//! - `PaperCtx` - 上下文封装（序号 + 论文 ID）
//! - `ReviewFlow` - 状态机（INITIAL → REFLECT×N → ENSEMBLE）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批次处理、去重、记账、取消
//! - `orchestrator/paper_processor` - 单篇论文：PDF → 评审 → 判定 → 上传
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, CrawlMode};
pub use error::{AppError, AppResult};
pub use models::{PaperRecord, ReviewDraft, ReviewOutcome};
pub use orchestrator::{App, BatchStats, CrawlBatch, PaperOutcome, PaperProcessor, RunOptions};
pub use workflow::{PaperCtx, ReviewFlow, ReviewSettings};
