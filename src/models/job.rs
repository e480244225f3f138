//! 任务记录
//!
//! 控制器独占修改权，展示层只通过 `watch::Receiver<Job>` 读取。

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};

use super::input_file::InputFile;

/// 任务所处阶段（不带数据，供展示层匹配）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Uploading,
    Processing,
    Done,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Idle => "Idle",
            JobState::Uploading => "Uploading",
            JobState::Processing => "Processing",
            JobState::Done => "Done",
            JobState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// 失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 提交请求失败（网络错误、非成功响应、响应格式错误）
    Submission,
    /// 某次状态查询在传输层失败
    StatusQuery,
    /// 服务明确报告任务失败
    Processing,
}

impl FailureKind {
    /// 展示给用户的文案
    pub fn user_message(self) -> &'static str {
        match self {
            FailureKind::Submission => "Upload failed",
            FailureKind::StatusQuery => "Error checking status",
            FailureKind::Processing => "Processing failed",
        }
    }
}

/// 任务失败信息
///
/// `detail` 只用于日志诊断，状态文案始终是 `kind` 对应的通用文案。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub detail: Option<String>,
}

impl JobFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    pub fn message(&self) -> &'static str {
        self.kind.user_message()
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.message(), detail),
            None => f.write_str(self.message()),
        }
    }
}

/// 阶段及其附带数据
///
/// `result_locator` 只存在于 `Done`，失败信息只存在于 `Failed`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Uploading,
    Processing,
    Done { result_locator: String },
    Failed(JobFailure),
}

/// 控制器跟踪的唯一任务
#[derive(Debug, Clone)]
pub struct Job {
    /// 服务分配的任务 ID，提交成功后才有
    pub id: Option<String>,
    pub input_file: Option<Arc<InputFile>>,
    pub status: JobStatus,
    /// 每次提交或重置加一，用于丢弃过期的响应
    pub generation: u64,
    /// 已应用的状态查询次数
    pub poll_count: u32,
    pub submitted_at: Option<DateTime<Local>>,
    pub finished_at: Option<DateTime<Local>>,
}

impl Default for Job {
    fn default() -> Self {
        Self::idle(0)
    }
}

impl Job {
    pub fn idle(generation: u64) -> Self {
        Self {
            id: None,
            input_file: None,
            status: JobStatus::Idle,
            generation,
            poll_count: 0,
            submitted_at: None,
            finished_at: None,
        }
    }

    pub(crate) fn uploading(generation: u64, file: Arc<InputFile>) -> Self {
        Self {
            input_file: Some(file),
            status: JobStatus::Uploading,
            submitted_at: Some(Local::now()),
            ..Self::idle(generation)
        }
    }

    pub(crate) fn mark_processing(&mut self, task_id: String) {
        self.id = Some(task_id);
        self.status = JobStatus::Processing;
    }

    pub(crate) fn mark_done(&mut self, result_locator: String) {
        self.status = JobStatus::Done { result_locator };
        self.finished_at = Some(Local::now());
    }

    pub(crate) fn mark_failed(&mut self, failure: JobFailure) {
        self.status = JobStatus::Failed(failure);
        self.finished_at = Some(Local::now());
    }

    pub fn state(&self) -> JobState {
        match self.status {
            JobStatus::Idle => JobState::Idle,
            JobStatus::Uploading => JobState::Uploading,
            JobStatus::Processing => JobState::Processing,
            JobStatus::Done { .. } => JobState::Done,
            JobStatus::Failed(_) => JobState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state(), JobState::Done | JobState::Failed)
    }

    pub fn result_locator(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Done { result_locator } => Some(result_locator),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match &self.status {
            JobStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(|f| f.kind)
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.failure().map(JobFailure::message)
    }

    /// 展示层显示的状态文案
    pub fn status_text(&self) -> &'static str {
        match &self.status {
            JobStatus::Idle => "",
            JobStatus::Uploading => "Uploading...",
            JobStatus::Processing => "Processing...",
            JobStatus::Done { .. } => "Done!",
            JobStatus::Failed(failure) => failure.message(),
        }
    }
}
