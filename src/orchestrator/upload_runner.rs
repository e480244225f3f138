//! 单次上传运行器 - 编排层
//!
//! ## 职责
//!
//! 命令行下的展示层：读取视频文件、提交、渲染每一次状态变化，
//! 任务完成后下载 CSV 并记录运行结果。
//!
//! ## 核心流程
//!
//! 1. **健康检查**：服务不可用只告警，不中止
//! 2. **提交**：交给 `JobController`，同时订阅任务记录
//! 3. **渲染**：阶段变化时输出一行日志，直到终态
//! 4. **收尾**：下载结果文件、追加运行记录、输出统计

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::clients::{HttpProcessingClient, ProcessingService};
use crate::config::Config;
use crate::controller::{ControllerSettings, JobController, SubmitOutcome};
use crate::models::{InputFile, Job, JobState};
use crate::utils::{basename, logging};

/// 一次运行的结果
#[derive(Debug)]
pub struct RunReport {
    pub job: Job,
    /// 结果文件在本地的保存位置
    pub saved_to: Option<PathBuf>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.job.state() == JobState::Done
    }
}

/// 应用主结构
pub struct App<S: ProcessingService = HttpProcessingClient> {
    config: Config,
    service: Arc<S>,
}

impl App<HttpProcessingClient> {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config.api_base_url, config.poll_interval_ms);

        let client = HttpProcessingClient::new(&config).context("无法创建处理服务客户端")?;
        Ok(Self::with_service(config, Arc::new(client)))
    }
}

impl<S: ProcessingService> App<S> {
    pub fn with_service(config: Config, service: Arc<S>) -> Self {
        Self { config, service }
    }

    /// 运行应用主逻辑
    pub async fn run(&self, video_path: &Path) -> Result<RunReport> {
        self.check_health().await;

        let file = InputFile::from_path(video_path)
            .await
            .with_context(|| format!("无法读取视频文件: {}", video_path.display()))?;
        if !file.is_video() {
            warn!("⚠️ {} 的类型不是视频 ({})，仍然尝试上传", file.name, file.media_type);
        }

        let controller = JobController::new(
            self.service.clone(),
            ControllerSettings::from_config(&self.config),
        );
        let rx = controller.subscribe();

        let (outcome, finished) =
            tokio::join!(controller.submit(Some(file)), render_until_terminal(rx));
        if let SubmitOutcome::Failed(failure) = &outcome {
            warn!("上传阶段失败: {}", failure);
        }
        let job = finished.unwrap_or_else(|| controller.snapshot());

        // 下载失败不影响任务结论，运行记录和统计照常输出
        let saved_to = match job.result_locator() {
            Some(locator) if self.config.download_artifact => {
                match self.save_artifact(locator).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!("⚠️ 结果文件未能保存: {:#}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        if !self.config.run_log_file.is_empty() {
            if let Err(e) = logging::append_run_record(&self.config.run_log_file, &job) {
                warn!("⚠️ 写入运行记录失败: {}", e);
            }
        }

        let saved_display = saved_to.as_ref().map(|p| p.display().to_string());
        logging::print_final_summary(&job, saved_display.as_deref());

        Ok(RunReport { job, saved_to })
    }

    async fn check_health(&self) {
        match self.service.health().await {
            Ok(true) => info!("✓ 处理服务在线"),
            Ok(false) => warn!("⚠️ 处理服务健康检查未通过"),
            Err(e) => warn!("⚠️ 处理服务健康检查失败: {}", e),
        }
    }

    /// 下载结果文件并保存到输出目录
    async fn save_artifact(&self, locator: &str) -> Result<PathBuf> {
        info!("📥 正在下载结果文件: {}", locator);
        let bytes = self
            .service
            .fetch_artifact(locator)
            .await
            .context("下载结果文件失败")?;

        let dir = Path::new(&self.config.output_dir);
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;

        let target = dir.join(basename(locator));
        tokio::fs::write(&target, &bytes)
            .await
            .with_context(|| format!("无法写入结果文件: {}", target.display()))?;
        Ok(target)
    }
}

/// 每次阶段变化输出一行，直到终态
///
/// 控制器被释放时返回 `None`。
async fn render_until_terminal(mut rx: watch::Receiver<Job>) -> Option<Job> {
    let mut last_state = JobState::Idle;
    loop {
        {
            let job = rx.borrow_and_update();
            if job.state() != last_state {
                logging::log_transition(&job);
                last_state = job.state();
            }
            if job.is_terminal() {
                return Some(job.clone());
            }
        }
        if rx.changed().await.is_err() {
            return None;
        }
    }
}
