//! 内容定位服务
//!
//! 把壁纸 / 文件夹 URI 解析为本地文件句柄。解析顺序固定：
//! 先按 `file://` URI 解析，再按普通文件系统路径解析。

use std::path::{Path, PathBuf};

use url::Url;

use crate::utils::error::{AppError, AppResult};

/// 解析后的内容句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub uri: String,
    pub path: PathBuf,
}

/// 内容定位能力
pub trait ContentResolver: Send + Sync {
    /// 解析 URI；无法解析时返回 `ContentUnavailable`
    fn resolve(&self, uri: &str) -> AppResult<ContentRef>;

    /// 内容是否仍然存在
    fn exists(&self, uri: &str) -> bool {
        self.resolve(uri).is_ok()
    }

    /// 解析目录；URI 不是目录时返回 `ContentUnavailable`
    fn resolve_dir(&self, uri: &str) -> AppResult<ContentRef> {
        let content = self.resolve(uri)?;
        if content.path.is_dir() {
            Ok(content)
        } else {
            Err(AppError::ContentUnavailable(uri.to_string()))
        }
    }
}

/// 本地文件系统实现
#[derive(Debug, Clone, Default)]
pub struct LocalContentResolver;

impl LocalContentResolver {
    pub fn new() -> Self {
        Self
    }

    /// `file://` URI 转为本地路径；其他 scheme 或非本机 host 返回 None
    fn from_file_uri(uri: &str) -> Option<PathBuf> {
        let url = Url::parse(uri).ok()?;
        if url.scheme() != "file" {
            return None;
        }
        url.to_file_path().ok()
    }
}

impl ContentResolver for LocalContentResolver {
    fn resolve(&self, uri: &str) -> AppResult<ContentRef> {
        let candidates = [Self::from_file_uri(uri), Some(PathBuf::from(uri))];

        candidates
            .into_iter()
            .flatten()
            .find(|path| path.exists())
            .map(|path| ContentRef {
                uri: uri.to_string(),
                path,
            })
            .ok_or_else(|| AppError::ContentUnavailable(uri.to_string()))
    }
}

/// 本地路径转为 URI 形式（统一使用正斜杠的绝对路径）
pub fn path_to_uri(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_plain_path_and_file_uri() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("my photo.jpg");
        fs::write(&file, b"x").unwrap();

        let resolver = LocalContentResolver::new();
        let plain = path_to_uri(&file);
        assert_eq!(resolver.resolve(&plain).unwrap().path, file);

        let uri = format!("file://{}", plain.replace(' ', "%20"));
        assert_eq!(resolver.resolve(&uri).unwrap().path, file);
    }

    #[test]
    fn test_missing_content_is_unavailable() {
        let resolver = LocalContentResolver::new();
        let err = resolver.resolve("/definitely/not/here.jpg").unwrap_err();
        assert!(matches!(err, AppError::ContentUnavailable(_)));
        assert!(!resolver.exists("file:///definitely/not/here.jpg"));
    }

    #[test]
    fn test_resolve_dir_rejects_files() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.png");
        fs::write(&file, b"x").unwrap();

        let resolver = LocalContentResolver::new();
        assert!(resolver.resolve_dir(&path_to_uri(tmp.path())).is_ok());
        assert!(resolver.resolve_dir(&path_to_uri(&file)).is_err());
    }

    #[test]
    fn test_file_uri_forms() {
        assert_eq!(
            LocalContentResolver::from_file_uri("file:///a%20b/%E9%A3%8E.png"),
            Some(PathBuf::from("/a b/风.png"))
        );
        assert_eq!(
            LocalContentResolver::from_file_uri("file://localhost/pics/1.jpg"),
            Some(PathBuf::from("/pics/1.jpg"))
        );
        assert_eq!(LocalContentResolver::from_file_uri("file://nas/pics/1.jpg"), None);
        assert_eq!(LocalContentResolver::from_file_uri("https://example.com/1.jpg"), None);
        assert_eq!(LocalContentResolver::from_file_uri("/plain/path.jpg"), None);
    }
}
