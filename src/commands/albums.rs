//! 相册管理命令

use std::fs;
use std::path::{Path, PathBuf};

use paperize_core::models::{Album, AlbumWithCount, CreateAlbum, Folder, SettingKey};
use paperize_core::services::{
    is_image_file, path_to_uri, DirectoryScanner, FolderScanner, LocalContentResolver,
    ScanOptions,
};
use paperize_core::{AppError, CommandError, SelectedAlbumRepository, SettingsStore};

use crate::AppState;

fn canonical(path: &Path) -> Result<PathBuf, CommandError> {
    fs::canonicalize(path)
        .map_err(|_| AppError::InvalidPath(path.display().to_string()).into())
}

/// 创建相册
pub fn create_album(
    state: &AppState,
    album_name: String,
    display_name: Option<String>,
) -> Result<Album, CommandError> {
    let input = CreateAlbum {
        album_name,
        display_name,
    };
    Ok(state.core.db.create_album(&input)?)
}

/// 添加图片文件，返回新增数量
pub fn add_wallpapers(
    state: &AppState,
    album_name: &str,
    paths: &[PathBuf],
) -> Result<usize, CommandError> {
    let mut uris = Vec::with_capacity(paths.len());
    for path in paths {
        let path = canonical(path)?;
        if !path.is_file() || !is_image_file(&path) {
            return Err(AppError::InvalidPath(format!("不是支持的图片: {}", path.display())).into());
        }
        uris.push(path_to_uri(&path));
    }

    Ok(state.core.db.add_wallpapers(album_name, &uris)?)
}

/// 扫描并添加文件夹
pub fn add_folder(
    state: &AppState,
    album_name: &str,
    folder: &Path,
    recursive: bool,
) -> Result<Folder, CommandError> {
    let folder = canonical(folder)?;
    if !folder.is_dir() {
        return Err(AppError::InvalidPath(folder.display().to_string()).into());
    }

    let scanner = DirectoryScanner::new(
        LocalContentResolver::new(),
        ScanOptions {
            recursive,
            ..ScanOptions::default()
        },
    );
    let folder_uri = path_to_uri(&folder);
    let wallpapers = scanner.list_wallpapers(&folder_uri)?;
    let display_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string());

    tracing::info!("添加文件夹 {} ({} 张壁纸)", folder_uri, wallpapers.len());
    Ok(state
        .core
        .db
        .add_folder(album_name, &folder_uri, display_name, wallpapers)?)
}

/// 获取所有相册（带数量）
pub fn list_albums(state: &AppState) -> Result<Vec<AlbumWithCount>, CommandError> {
    Ok(state.core.db.get_all_albums()?)
}

/// 删除相册；被选中时同时取消选中并清除目标上的相册名
pub fn delete_album(state: &AppState, album_name: &str) -> Result<bool, CommandError> {
    let core = &state.core;
    core.db.cascade_delete_album(album_name)?;

    for key in [SettingKey::HomeAlbumName, SettingKey::LockAlbumName] {
        if core.settings.get_string(key).as_deref() == Some(album_name) {
            core.settings.remove(key)?;
        }
    }

    Ok(core.db.delete_album_by_name(album_name)?)
}
