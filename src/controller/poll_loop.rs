//! 状态轮询
//!
//! 每个任务一个轮询任务，按固定间隔发起状态查询，直到任务进入终态或被取消。
//! 查询在循环内 await，同一时刻最多只有一个查询在途。

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::job_controller::ControllerSettings;
use crate::clients::ProcessingService;
use crate::error::AppResult;
use crate::models::{FailureKind, Job, JobFailure, StatusResponse, TaskState};
use crate::utils::result_locator;

/// 一次状态查询的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    Pending,
    Done { result_locator: String },
    Failed(JobFailure),
}

impl PollOutcome {
    pub(crate) fn from_response(
        response: AppResult<StatusResponse>,
        artifact_base: &str,
    ) -> Self {
        let status = match response {
            Ok(status) => status,
            Err(e) => {
                return PollOutcome::Failed(JobFailure::new(
                    FailureKind::StatusQuery,
                    e.to_string(),
                ))
            }
        };

        match status.state {
            TaskState::Success => {
                match status
                    .result
                    .as_deref()
                    .and_then(|path| result_locator(artifact_base, path))
                {
                    Some(locator) => PollOutcome::Done {
                        result_locator: locator,
                    },
                    None => PollOutcome::Failed(JobFailure::new(
                        FailureKind::StatusQuery,
                        format!("SUCCESS 响应缺少可用的 result: {:?}", status.result),
                    )),
                }
            }
            TaskState::Failure => PollOutcome::Failed(JobFailure {
                kind: FailureKind::Processing,
                detail: status.result,
            }),
            _ => PollOutcome::Pending,
        }
    }
}

/// 轮询任务需要的全部上下文
pub(crate) struct PollContext<S> {
    pub service: Arc<S>,
    pub job: Arc<watch::Sender<Job>>,
    pub settings: Arc<ControllerSettings>,
    pub generation: u64,
    pub token: CancellationToken,
    pub task_id: String,
}

/// 只在任务仍是当前任务、未被取消且未到终态时修改
///
/// 检查和修改都在 watch 的锁内完成，过期响应无法穿插进来。
pub(crate) fn update_if_current(
    job: &watch::Sender<Job>,
    generation: u64,
    token: &CancellationToken,
    apply: impl FnOnce(&mut Job),
) -> bool {
    job.send_if_modified(|current| {
        if token.is_cancelled() || current.generation != generation || current.is_terminal() {
            return false;
        }
        apply(current);
        true
    })
}

/// 应用一次查询结论，返回是否继续轮询
pub(crate) fn apply_outcome(
    job: &watch::Sender<Job>,
    generation: u64,
    token: &CancellationToken,
    task_id: &str,
    outcome: PollOutcome,
) -> ControlFlow<()> {
    match outcome {
        PollOutcome::Pending => {
            if update_if_current(job, generation, token, |job| job.poll_count += 1) {
                debug!("[任务 {}] ⏳ 仍在处理中", task_id);
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        }
        PollOutcome::Done { result_locator } => {
            let locator = result_locator.clone();
            if update_if_current(job, generation, token, |job| {
                job.poll_count += 1;
                job.mark_done(result_locator);
            }) {
                info!("[任务 {}] ✅ 处理完成: {}", task_id, locator);
            }
            ControlFlow::Break(())
        }
        PollOutcome::Failed(failure) => {
            let text = failure.to_string();
            if update_if_current(job, generation, token, |job| {
                job.poll_count += 1;
                job.mark_failed(failure);
            }) {
                warn!("[任务 {}] ❌ {}", task_id, text);
            }
            ControlFlow::Break(())
        }
    }
}

/// 轮询主循环
///
/// 第一次查询在一个间隔之后发出；没有次数上限，也没有总超时。
pub(crate) async fn run<S: ProcessingService>(ctx: PollContext<S>) {
    let period = ctx.settings.poll_interval;
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ctx.token.cancelled() => {
                debug!("[任务 {}] 轮询已取消", ctx.task_id);
                return;
            }
            _ = ticker.tick() => {}
        }

        let response = tokio::select! {
            _ = ctx.token.cancelled() => {
                debug!("[任务 {}] 轮询已取消，丢弃在途的状态查询", ctx.task_id);
                return;
            }
            response = ctx.service.status(&ctx.task_id) => response,
        };

        let outcome = PollOutcome::from_response(response, &ctx.settings.artifact_base);
        if apply_outcome(&ctx.job, ctx.generation, &ctx.token, &ctx.task_id, outcome).is_break() {
            ctx.token.cancel();
            return;
        }
    }
}
