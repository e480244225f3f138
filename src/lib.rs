//! # Video Job Client
//!
//! 把视频提交给远程处理服务，轮询异步任务，任务完成后取回生成的 CSV。
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 与处理服务通信，只暴露能力
//! - `ProcessingService` - upload / status / artifact / health
//! - `HttpProcessingClient` - 基于 reqwest 的实现
//!
//! ### ② 控制层（Controller）
//! - `controller/` - 单个任务的生命周期
//! - `JobController` - 提交、轮询、取代、重置
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/` - 命令行展示层，驱动一次完整运行
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod utils;

// 重新导出常用类型
pub use clients::{HttpProcessingClient, ProcessingService};
pub use config::Config;
pub use controller::{ControllerSettings, JobController, SubmitOutcome};
pub use error::{AppError, AppResult};
pub use models::{FailureKind, InputFile, Job, JobFailure, JobState, JobStatus};
pub use orchestrator::{App, RunReport};
