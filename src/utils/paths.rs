/// 取路径最后一段
///
/// `/` 和 `\` 都视为分隔符，没有分隔符时原样返回。
pub fn basename(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}

/// 用结果路径的文件名拼出下载地址
///
/// 文件名为空（例如路径以分隔符结尾）时返回 `None`。
pub fn result_locator(artifact_base: &str, result_path: &str) -> Option<String> {
    let name = basename(result_path.trim());
    if name.is_empty() {
        return None;
    }
    Some(format!("{}/{}", artifact_base.trim_end_matches('/'), name))
}
