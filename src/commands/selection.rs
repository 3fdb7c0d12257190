//! 相册选中命令

use paperize_core::models::{SelectedAlbum, SettingKey, Target};
use paperize_core::{AlbumRepository, AppError, CommandError, SelectedAlbumRepository, SettingsStore};

use crate::AppState;

fn album_key(target: Target) -> SettingKey {
    SettingKey::for_target(target, SettingKey::HomeAlbumName, SettingKey::LockAlbumName)
}

fn enable_key(target: Target) -> SettingKey {
    SettingKey::for_target(
        target,
        SettingKey::EnableHomeWallpaper,
        SettingKey::EnableLockWallpaper,
    )
}

/// 选中相册作为目标的轮换来源
///
/// 两个目标都未指定时同时选为主屏与锁屏来源。不再被任何目标引用的旧选中会被级联删除。
pub fn select_album(
    state: &AppState,
    album_name: &str,
    home: bool,
    lock: bool,
) -> Result<SelectedAlbum, CommandError> {
    let core = &state.core;
    let aww = core
        .db
        .get_album_with_wallpaper_and_folder(album_name)?
        .ok_or_else(|| AppError::Config(format!("相册不存在: {}", album_name)))?;
    let selected = SelectedAlbum::from_album(&aww);
    if selected.wallpapers.is_empty() {
        return Err(AppError::EmptyAlbum(album_name.to_string()).into());
    }

    let targets: Vec<Target> = match (home, lock) {
        (false, false) => Target::BOTH.to_vec(),
        _ => Target::BOTH
            .into_iter()
            .filter(|t| match t {
                Target::Home => home,
                Target::Lock => lock,
            })
            .collect(),
    };

    core.db.upsert_selected_album(&selected)?;
    for target in &targets {
        core.settings.put_string(album_key(*target), album_name)?;
        core.settings.put_bool(enable_key(*target), true)?;
    }
    core.settings.put_bool(SettingKey::EnableChanger, true)?;

    let referenced: Vec<String> = Target::BOTH
        .into_iter()
        .filter_map(|t| core.settings.get_string(album_key(t)))
        .collect();
    for stale in core.db.get_selected_albums()? {
        if !referenced.iter().any(|name| name == stale.name()) {
            core.db.cascade_delete_album(stale.name())?;
        }
    }

    tracing::info!("选中相册 {} -> {:?}", album_name, targets);
    Ok(selected)
}

/// 取消全部选中并关闭轮换
pub fn deselect_all(state: &AppState) -> Result<(), CommandError> {
    let core = &state.core;
    core.db.delete_all()?;
    for target in Target::BOTH {
        core.settings.remove(album_key(target))?;
    }
    core.settings.put_bool(SettingKey::EnableChanger, false)?;
    Ok(())
}
