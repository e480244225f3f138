use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult, FileError};

/// 指定 TOML 配置文件路径的环境变量
pub const CONFIG_FILE_ENV: &str = "VIDEO_JOB_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 处理服务地址（upload / status / health 都挂在它下面）
    pub api_base_url: String,
    /// 结果文件的下载根路径
    pub artifact_base_url: String,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 单次请求超时（秒），0 表示不设超时
    pub request_timeout_secs: u64,
    /// 结果 CSV 保存目录
    pub output_dir: String,
    /// 任务完成后是否下载结果文件
    pub download_artifact: bool,
    /// 运行记录文件，空字符串表示不记录
    pub run_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            artifact_base_url: "http://localhost:8000/output/".to_string(),
            poll_interval_ms: 3000,
            request_timeout_secs: 0,
            output_dir: "output".to_string(),
            download_artifact: true,
            run_log_file: String::new(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 先读 `VIDEO_JOB_CONFIG` 指向的 TOML 文件（如果有），再叠加环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.is_empty() => Self::from_toml_file(Path::new(&path))?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载配置，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(FileError::NotFound { path: display }.into());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(&display, e))?;
        toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: display,
                source: Box::new(e),
            })
        })
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(self.api_base_url),
            artifact_base_url: std::env::var("ARTIFACT_BASE_URL")
                .unwrap_or(self.artifact_base_url),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS").unwrap_or(self.poll_interval_ms),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS")
                .unwrap_or(self.request_timeout_secs),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(self.output_dir),
            download_artifact: env_parse("DOWNLOAD_ARTIFACT").unwrap_or(self.download_artifact),
            run_log_file: std::env::var("RUN_LOG_FILE").unwrap_or(self.run_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(AppError::invalid_config("poll_interval_ms", "必须大于 0"));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::invalid_config("api_base_url", "不能为空"));
        }
        if self.artifact_base_url.trim().is_empty() {
            return Err(AppError::invalid_config("artifact_base_url", "不能为空"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        (self.request_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.request_timeout_secs))
    }
}

/// 读取并解析环境变量，缺失或解析失败时返回 `None`
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_service_layout() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), std::time::Duration::from_secs(3));
        assert!(config.request_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_missing_keys_use_defaults() {
        let config: Config = toml::from_str(
            r#"
            api_base_url = "http://media-box:9000"
            poll_interval_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "http://media-box:9000");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.artifact_base_url, "http://localhost:8000/output/");
        assert!(config.download_artifact);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = Config {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(crate::error::ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_from_toml_file_missing_is_not_found() {
        let result = Config::from_toml_file(Path::new("definitely/not/here.toml"));
        assert!(matches!(result, Err(AppError::File(FileError::NotFound { .. }))));
    }
}
