//! 任务生命周期控制层
//!
//! ## 职责
//!
//! - `job_controller` - 持有唯一的任务记录，处理提交、重置和取代
//! - `poll_loop` - 固定间隔的状态轮询，到终态或被取消时退出
//!
//! ## 状态流转
//!
//! ```text
//! Idle ──submit──▶ Uploading ──成功──▶ Processing ──SUCCESS──▶ Done
//!                      │                   │  ▲
//!                      └──失败──▶ Failed ◀──┘  └── PENDING
//!                                  (FAILURE / 查询出错)
//! ```
//!
//! 终态不会再被轮询修改；新的 `submit` 会从任何状态重新开始。

pub mod job_controller;
mod poll_loop;

pub use job_controller::{ControllerSettings, JobController, SubmitOutcome};
