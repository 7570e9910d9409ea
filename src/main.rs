use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use arxiv_review_crawler::config::{Config, CrawlMode};
use arxiv_review_crawler::orchestrator::{App, RunOptions};
use arxiv_review_crawler::utils::logging;

/// arXiv 论文抓取与 AI 评审
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// 抓取模式
    #[arg(long, value_enum, default_value_t = CrawlMode::Latest)]
    mode: CrawlMode,

    /// 持续运行，每隔 CRAWL_INTERVAL_SECS 秒抓取一批
    #[arg(long)]
    watch: bool,

    /// 覆盖 REVIEWER_REFLECTION
    #[arg(long)]
    reflection: Option<usize>,

    /// 演练：不上传，也不写入去重账本
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载 .env（不存在时忽略）
    let _ = dotenvy::dotenv();

    // 加载配置
    let mut config = Config::from_env()?;
    if let Some(rounds) = cli.reflection {
        config.reviewer_reflection = rounds;
    }

    // 初始化日志
    let _log_guard = logging::init(&config.log_dir)?;

    config.validate()?;

    // Ctrl-C：当前论文处理完后停止
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⛔ 收到 Ctrl-C，当前论文处理完成后退出...");
            signal_token.cancel();
        }
    });

    let options = RunOptions {
        mode: cli.mode,
        watch: cli.watch,
        dry_run: cli.dry_run,
    };

    // 初始化并运行应用
    let mut app = App::initialize(config, options).await?;
    if let Err(e) = app.run(cancel).await {
        error!("❌ 程序异常终止: {}", e);
        return Err(e.into());
    }

    Ok(())
}
