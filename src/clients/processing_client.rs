//! 处理服务客户端
//!
//! 封装所有与视频处理服务相关的调用逻辑

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{HealthResponse, InputFile, StatusResponse, UploadResponse};

/// 上传时 multipart 中的字段名
pub const UPLOAD_FIELD: &str = "video";

/// 处理服务提供的能力
///
/// 控制器只依赖这个 trait，测试时可以替换成脚本化的实现。
#[async_trait]
pub trait ProcessingService: Send + Sync + 'static {
    /// 提交文件，返回任务 ID
    async fn submit(&self, file: &InputFile) -> AppResult<String>;

    /// 查询任务状态
    async fn status(&self, task_id: &str) -> AppResult<StatusResponse>;

    /// 下载结果文件
    async fn fetch_artifact(&self, locator: &str) -> AppResult<Vec<u8>>;

    /// 服务健康检查
    async fn health(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// 基于 HTTP 的处理服务客户端
pub struct HttpProcessingClient {
    client: Client,
    base_url: String,
}

impl HttpProcessingClient {
    /// 创建新的处理服务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_base_url(&config.api_base_url, config.request_timeout())
    }

    /// 使用自定义地址创建
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> AppResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Other(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 状态查询地址，任务 ID 作为单独的路径段进行转义
    fn status_endpoint(&self, task_id: &str) -> AppResult<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::api_request_failed(&self.base_url, e))?;
        url.path_segments_mut()
            .map_err(|_| AppError::malformed_response(&self.base_url, "地址不能包含路径段"))?
            .pop_if_empty()
            .extend(["api", "status", task_id]);
        Ok(url.to_string())
    }

    /// 非 2xx 响应转换为 `BadResponse`
    async fn check_status(endpoint: &str, response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.ok().filter(|b| !b.is_empty());
        Err(ApiError::BadResponse {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        }
        .into())
    }

    async fn decode_json<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        response: Response,
    ) -> AppResult<T> {
        let text = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::malformed_response(endpoint, format!("{} (body: {})", e, text)))
    }
}

#[async_trait]
impl ProcessingService for HttpProcessingClient {
    async fn submit(&self, file: &InputFile) -> AppResult<String> {
        let endpoint = self.endpoint("/api/upload");
        debug!(
            "上传文件 {} ({} 字节, {})",
            file.name,
            file.size(),
            file.media_type
        );

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;
        let response = Self::check_status(&endpoint, response).await?;
        let upload: UploadResponse = Self::decode_json(&endpoint, response).await?;

        if upload.task_id.trim().is_empty() {
            return Err(AppError::malformed_response(&endpoint, "task_id 为空"));
        }

        debug!("上传结果: task_id={}", upload.task_id);
        Ok(upload.task_id)
    }

    async fn status(&self, task_id: &str) -> AppResult<StatusResponse> {
        let endpoint = self.status_endpoint(task_id)?;

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;
        let response = Self::check_status(&endpoint, response).await?;
        let status: StatusResponse = Self::decode_json(&endpoint, response).await?;

        debug!("任务 {} 状态: {:?}", task_id, status.state);
        Ok(status)
    }

    async fn fetch_artifact(&self, locator: &str) -> AppResult<Vec<u8>> {
        // 结果地址可能是完整 URL，也可能是相对于服务地址的路径
        let url = if locator.starts_with("http://") || locator.starts_with("https://") {
            locator.to_string()
        } else {
            self.endpoint(&format!("/{}", locator.trim_start_matches('/')))
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&url, e))?;
        let response = Self::check_status(&url, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(&url, e))?;

        debug!("下载结果文件 {} ({} 字节)", url, bytes.len());
        Ok(bytes.to_vec())
    }

    async fn health(&self) -> AppResult<bool> {
        let endpoint = self.endpoint("/health");

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let health: HealthResponse = Self::decode_json(&endpoint, response).await?;
        Ok(health.status == "ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpProcessingClient::with_base_url("http://localhost:8000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.endpoint("/api/status/abc123"),
            "http://localhost:8000/api/status/abc123"
        );
    }

    #[test]
    fn test_status_endpoint_escapes_task_id() {
        let client = HttpProcessingClient::with_base_url("http://localhost:8000/", None).unwrap();
        assert_eq!(
            client.status_endpoint("abc123").unwrap(),
            "http://localhost:8000/api/status/abc123"
        );
        assert_eq!(
            client.status_endpoint("a/b?c#d").unwrap(),
            "http://localhost:8000/api/status/a%2Fb%3Fc%23d"
        );
    }

    #[test]
    fn test_status_endpoint_keeps_base_path() {
        let client = HttpProcessingClient::with_base_url("http://gateway/video/", None).unwrap();
        assert_eq!(
            client.status_endpoint("t-1").unwrap(),
            "http://gateway/video/api/status/t-1"
        );
    }
}
