//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use std::fs::OpenOptions;
use std::io::Write;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};
use crate::models::Job;

/// 初始化 tracing 输出
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(api_base_url: &str, poll_interval_ms: u64) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 视频处理任务客户端");
    info!("🌐 处理服务: {}", api_base_url);
    info!("⏱️ 轮询间隔: {} ms", poll_interval_ms);
    info!("{}", "=".repeat(60));
}

/// 记录一次状态变化
pub fn log_transition(job: &Job) {
    let id = job.id.as_deref().unwrap_or("-");
    match job.failure() {
        Some(failure) => info!("[任务 {}] ❌ {} | {}", id, job.state(), failure),
        None => info!("[任务 {}] {} | {}", id, job.state(), job.status_text()),
    }
}

/// 打印最终结果
pub fn print_final_summary(job: &Job, saved_to: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 任务结束");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("任务 ID: {}", job.id.as_deref().unwrap_or("-"));
    info!("状态: {}", job.status_text());
    if let Some(locator) = job.result_locator() {
        info!("✅ 下载地址: {}", locator);
    }
    if let Some(path) = saved_to {
        info!("💾 已保存至: {}", path);
    }
    if let (Some(start), Some(end)) = (job.submitted_at, job.finished_at) {
        info!("⏳ 耗时: {} 秒", (end - start).num_seconds());
    }
    info!("{}", "=".repeat(60));
}

/// 追加一行运行记录
pub fn append_run_record(log_file_path: &str, job: &Job) -> AppResult<()> {
    let file_name = job
        .input_file
        .as_ref()
        .map(|f| f.name.as_str())
        .unwrap_or("-");
    let line = format!(
        "{} | {} | {} | {} | {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        truncate_text(file_name, 60),
        job.id.as_deref().unwrap_or("-"),
        job.state(),
        job.result_locator().or(job.error_message()).unwrap_or("")
    );

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    Ok(())
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("羽毛球比赛录像.mp4", 3), "羽毛球...");
        assert_eq!(truncate_text("short.mp4", 60), "short.mp4");
    }

    #[test]
    fn test_append_run_record_writes_line() {
        let path = std::env::temp_dir().join(format!("vjc_runlog_{}.txt", std::process::id()));
        let path = path.to_string_lossy().to_string();
        let _ = std::fs::remove_file(&path);

        append_run_record(&path, &Job::default()).unwrap();
        append_run_record(&path, &Job::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("Idle"));
        let _ = std::fs::remove_file(&path);
    }
}
