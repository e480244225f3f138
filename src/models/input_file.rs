use std::fmt;
use std::path::Path;

use crate::error::{AppError, AppResult, FileError};

/// 用户选中的待上传文件
///
/// 一旦开始提交就不再修改，控制器内部以 `Arc<InputFile>` 持有。
#[derive(Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            media_type: media_type.into(),
        }
    }

    /// 从磁盘读取文件，按扩展名推断媒体类型
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(FileError::NotFound { path: display }.into());
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(&display, e))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| display.clone());

        Ok(Self {
            media_type: media_type_for(path).to_string(),
            name,
            bytes,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_video(&self) -> bool {
        self.media_type.starts_with("video/")
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .field("media_type", &self.media_type)
            .finish()
    }
}

fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(media_type_for(Path::new("rally.MP4")), "video/mp4");
        assert_eq!(media_type_for(Path::new("rally.mov")), "video/quicktime");
        assert_eq!(media_type_for(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(media_type_for(Path::new("no_extension")), "application/octet-stream");
    }

    #[test]
    fn test_debug_hides_payload() {
        let file = InputFile::new("a.mp4", vec![0u8; 4096], "video/mp4");
        let text = format!("{:?}", file);
        assert!(text.contains("4096"));
        assert!(!text.contains("0, 0, 0"));
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let result = InputFile::from_path(Path::new("missing/match.mp4")).await;
        assert!(matches!(result, Err(AppError::File(FileError::NotFound { .. }))));
    }

    #[tokio::test]
    async fn test_from_path_reads_bytes() {
        let path = std::env::temp_dir().join(format!("vjc_input_{}.webm", std::process::id()));
        tokio::fs::write(&path, b"fake webm").await.unwrap();

        let file = InputFile::from_path(&path).await.unwrap();
        assert_eq!(file.bytes, b"fake webm");
        assert_eq!(file.media_type, "video/webm");
        assert!(file.is_video());
        assert!(file.name.ends_with(".webm"));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
