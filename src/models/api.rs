//! 处理服务的请求/响应结构

use serde::{Deserialize, Serialize};

/// `POST /api/upload` 的响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub task_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// 后端任务队列报告的任务状态
///
/// 只有 `Success` 和 `Failure` 是终态，其余状态一律按 `Pending` 处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Pending,
    Started,
    Retry,
    Revoked,
    Success,
    Failure,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }
}

/// `GET /api/status/{task_id}` 的响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: TaskState,
    /// 结果文件路径，只在 `SUCCESS` 时出现
    #[serde(default)]
    pub result: Option<String>,
}

impl StatusResponse {
    pub fn pending() -> Self {
        Self {
            state: TaskState::Pending,
            result: None,
        }
    }

    pub fn success(result: impl Into<String>) -> Self {
        Self {
            state: TaskState::Success,
            result: Some(result.into()),
        }
    }

    pub fn failure() -> Self {
        Self {
            state: TaskState::Failure,
            result: None,
        }
    }
}

/// `GET /health` 的响应
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
