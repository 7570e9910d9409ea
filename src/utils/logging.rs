/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{Config, CrawlMode};
use crate::orchestrator::BatchStats;

/// 初始化日志：控制台 + 按天滚动的日志文件
///
/// 返回的 guard 需要一直持有到程序退出，否则文件中的尾部日志会丢失。
pub fn init(log_dir: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir).with_context(|| format!("无法创建日志目录: {}", log_dir))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "crawler.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer().with_target(false).with_filter(env_filter());
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(env_filter());

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("日志系统初始化失败")?;

    Ok(guard)
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, mode: CrawlMode, watch: bool, dry_run: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - arXiv 论文抓取与评审");
    info!(
        "📊 模式: {} | 每批最多 {} 篇 | 持续运行: {}",
        mode,
        config.max_results(mode),
        watch
    );
    info!(
        "🤖 评审模型: {} | 反思轮数: {} | 评分阈值: {}",
        config.reviewer_model, config.reviewer_reflection, config.rating_threshold
    );
    if dry_run {
        info!("🧪 演练模式：不上传、不记账");
    }
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号（持续运行模式下递增）
/// - `fetched`: 本批获取的论文数
/// - `pending`: 去重后待处理的论文数
pub fn log_batch_start(batch_num: usize, fetched: usize, pending: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {} 批", batch_num);
    info!(
        "📄 获取 {} 篇，已处理过 {} 篇，本批待处理 {} 篇",
        fetched,
        fetched - pending,
        pending
    );
    info!("{}", "=".repeat(60));
}

/// 打印批次统计信息
pub fn print_batch_stats(batch_num: usize, stats: &BatchStats, elapsed: Duration) {
    info!("\n{}", "=".repeat(60));
    info!("📊 第 {} 批处理完成统计", batch_num);
    info!(
        "完成时间: {} (耗时 {:.1} 秒)",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        elapsed.as_secs_f64()
    );
    info!("{}", "=".repeat(60));
    info!(
        "✅ 已上传: {} (含评审 {})",
        stats.uploaded, stats.uploaded_with_review
    );
    info!("🗑️ 已丢弃: {}", stats.dropped);
    info!("🚫 后端拒绝: {}", stats.rejected);
    info!("⏳ 暂缓重试: {}", stats.deferred);
    info!("⏭️ 已处理过: {}", stats.skipped_duplicates);
    if stats.dry_run > 0 {
        info!("🧪 演练: {}", stats.dry_run);
    }
    if stats.cancelled {
        info!("⛔ 批次被中断");
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 日志文件所在目录的展示用路径
pub fn log_location(log_dir: &str) -> String {
    Path::new(log_dir).join("crawler.log.<日期>").display().to_string()
}
