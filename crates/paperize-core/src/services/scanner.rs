//! 文件夹扫描服务
//!
//! 负责列出文件夹中的壁纸，过滤非图片文件

use std::path::Path;

use walkdir::WalkDir;

use crate::utils::error::{AppError, AppResult};

use super::resolver::{path_to_uri, ContentResolver, LocalContentResolver};

/// 支持的图片格式（可由 image crate 解码）
pub const SUPPORTED_FORMATS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico", "tga", "pnm",
];

/// 扫描选项
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    /// 是否递归扫描子目录
    pub recursive: bool,
    /// 排除的目录名
    pub exclude_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            exclude_dirs: vec![
                ".thumbnails".to_string(),
                "$RECYCLE.BIN".to_string(),
                "System Volume Information".to_string(),
            ],
        }
    }
}

/// 文件夹扫描能力
pub trait FolderScanner: Send + Sync {
    /// 列出文件夹中的壁纸 URI（有序）
    fn list_wallpapers(&self, folder_uri: &str) -> AppResult<Vec<String>>;
}

/// 基于 walkdir 的本地目录扫描器
pub struct DirectoryScanner<R = LocalContentResolver> {
    resolver: R,
    options: ScanOptions,
}

impl DirectoryScanner<LocalContentResolver> {
    /// 使用默认选项创建扫描器
    pub fn with_defaults() -> Self {
        Self::new(LocalContentResolver::new(), ScanOptions::default())
    }
}

impl<R: ContentResolver> DirectoryScanner<R> {
    pub fn new(resolver: R, options: ScanOptions) -> Self {
        Self { resolver, options }
    }

    /// 检查是否应该包含此条目（返回 true 表示包含）
    fn should_include_entry(&self, entry: &walkdir::DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }

        let name = entry.file_name().to_string_lossy();

        // 跳过隐藏目录
        if name.starts_with('.') {
            return false;
        }

        !self.options.exclude_dirs.iter().any(|d| d == &*name)
    }
}

impl<R: ContentResolver> FolderScanner for DirectoryScanner<R> {
    fn list_wallpapers(&self, folder_uri: &str) -> AppResult<Vec<String>> {
        let dir = self.resolver.resolve_dir(folder_uri).map_err(|_| {
            AppError::InvalidPath(format!("目录不存在: {}", folder_uri))
        })?;

        let mut walker = WalkDir::new(&dir.path);
        if !self.options.recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        let mut skipped = 0usize;

        for entry in walker.into_iter().filter_entry(|e| self.should_include_entry(e)) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if is_image_file(entry.path()) {
                        files.push(path_to_uri(entry.path()));
                    } else {
                        skipped += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("扫描错误: {}", e);
                    skipped += 1;
                }
            }
        }

        files.sort_by(|a, b| natord::compare(a, b));

        tracing::debug!(
            "扫描文件夹 {}: {} 张壁纸, {} 个跳过",
            folder_uri,
            files.len(),
            skipped
        );

        Ok(files)
    }
}

/// 快速检查文件是否是支持的图片格式
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_FORMATS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
