use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::poll_loop::{self, update_if_current, PollContext};
use crate::clients::ProcessingService;
use crate::config::Config;
use crate::models::{FailureKind, InputFile, Job, JobFailure};

/// 控制器运行参数
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// 状态查询间隔
    pub poll_interval: Duration,
    /// 结果文件的下载根路径
    pub artifact_base: String,
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            artifact_base: config.artifact_base_url.clone(),
        }
    }
}

/// 一次 `submit` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 没有选择文件，什么也没做
    NoFileSelected,
    /// 上传成功，已开始轮询
    Processing { task_id: String },
    /// 上传失败，不会轮询
    Failed(JobFailure),
    /// 上传完成前被新的提交或重置取代
    Superseded,
}

struct ActivePoll {
    generation: u64,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// 任务生命周期控制器
///
/// 同一时刻只跟踪一个任务：Idle → Uploading → Processing → Done / Failed。
/// 新的提交或重置会取消上一任务的轮询，过期的响应不会再修改任务。
pub struct JobController<S: ProcessingService> {
    service: Arc<S>,
    settings: Arc<ControllerSettings>,
    job: Arc<watch::Sender<Job>>,
    active: Mutex<Option<ActivePoll>>,
}

impl<S: ProcessingService> JobController<S> {
    pub fn new(service: Arc<S>, settings: ControllerSettings) -> Self {
        let (job, _) = watch::channel(Job::default());
        Self {
            service,
            settings: Arc::new(settings),
            job: Arc::new(job),
            active: Mutex::new(None),
        }
    }

    /// 展示层使用的只读视图
    pub fn subscribe(&self) -> watch::Receiver<Job> {
        self.job.subscribe()
    }

    pub fn snapshot(&self) -> Job {
        self.job.borrow().clone()
    }

    /// 当前是否有轮询在进行
    pub fn is_polling(&self) -> bool {
        self.lock_active()
            .as_ref()
            .map(|poll| poll.handle.is_some() && !poll.token.is_cancelled())
            .unwrap_or(false)
    }

    /// 提交文件
    ///
    /// 返回前任务已经进入 Processing 或 Failed（除非被新的提交取代）。
    /// 状态在发出请求之前就切换到 Uploading。
    pub async fn submit(&self, file: Option<InputFile>) -> SubmitOutcome {
        let Some(file) = file else {
            debug!("未选择文件，忽略提交");
            return SubmitOutcome::NoFileSelected;
        };

        let file = Arc::new(file);
        let (generation, token) = self.begin_job(file.clone());
        info!("📤 正在上传 {} ({} 字节)...", file.name, file.size());

        let result = tokio::select! {
            _ = token.cancelled() => {
                debug!("上传被新的提交取代 (generation {})", generation);
                return SubmitOutcome::Superseded;
            }
            result = self.service.submit(&file) => result,
        };

        match result {
            Ok(task_id) => {
                let applied = update_if_current(&self.job, generation, &token, |job| {
                    job.mark_processing(task_id.clone())
                });
                if !applied {
                    return SubmitOutcome::Superseded;
                }
                info!("[任务 {}] ✓ 上传成功，开始轮询", task_id);
                self.start_polling(generation, token, task_id.clone());
                SubmitOutcome::Processing { task_id }
            }
            Err(e) => {
                warn!("❌ 上传失败: {}", e);
                let failure = JobFailure::new(FailureKind::Submission, e.to_string());
                let applied = update_if_current(&self.job, generation, &token, |job| {
                    job.mark_failed(failure.clone())
                });
                token.cancel();
                if applied {
                    SubmitOutcome::Failed(failure)
                } else {
                    SubmitOutcome::Superseded
                }
            }
        }
    }

    /// 回到 Idle，取消正在进行的轮询
    pub fn reset(&self) {
        let mut active = self.lock_active();
        if let Some(previous) = active.take() {
            previous.token.cancel();
        }
        self.job.send_modify(|job| *job = Job::idle(job.generation + 1));
        info!("🔄 任务已重置");
    }

    /// 取消上一任务并登记新任务，返回新任务的 generation 和取消令牌
    fn begin_job(&self, file: Arc<InputFile>) -> (u64, CancellationToken) {
        let mut active = self.lock_active();
        if let Some(previous) = active.take() {
            previous.token.cancel();
            debug!("取消上一任务的轮询 (generation {})", previous.generation);
        }

        let token = CancellationToken::new();
        let mut generation = 0;
        self.job.send_modify(|job| {
            generation = job.generation + 1;
            *job = Job::uploading(generation, file);
        });

        *active = Some(ActivePoll {
            generation,
            token: token.clone(),
            handle: None,
        });
        (generation, token)
    }

    fn start_polling(&self, generation: u64, token: CancellationToken, task_id: String) {
        let handle = tokio::spawn(poll_loop::run(PollContext {
            service: self.service.clone(),
            job: self.job.clone(),
            settings: self.settings.clone(),
            generation,
            token: token.clone(),
            task_id,
        }));

        let mut active = self.lock_active();
        match active.as_mut() {
            Some(poll) if poll.generation == generation => poll.handle = Some(handle),
            // 已经被取代，轮询任务会在第一次检查令牌时退出
            _ => token.cancel(),
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActivePoll>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: ProcessingService> Drop for JobController<S> {
    fn drop(&mut self) {
        if let Some(poll) = self.lock_active().take() {
            poll.token.cancel();
        }
    }
}
