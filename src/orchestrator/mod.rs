//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把一次命令行调用变成一个完整的任务：提交、观察、下载、记录。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (命令行展示层)
//!     ↓
//! controller::JobController (任务生命周期)
//!     ↓
//! clients::ProcessingService (upload / status / artifact)
//! ```
//!
//! ## 设计原则
//!
//! 1. **只读订阅**：编排层通过 `watch::Receiver<Job>` 观察任务，不直接修改
//! 2. **向下依赖**：编排层 → controller → clients

pub mod upload_runner;

pub use upload_runner::{App, RunReport};
