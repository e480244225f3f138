use std::path::PathBuf;

use anyhow::{Context, Result};
use video_job_client::utils::logging;
use video_job_client::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let video_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("用法: video-job-client <视频文件>")?;

    // 初始化并运行应用
    let app: App = App::initialize(config).await?;
    let report = app.run(&video_path).await?;

    if !report.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
