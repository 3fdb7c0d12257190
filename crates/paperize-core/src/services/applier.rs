//! 壁纸应用服务

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::models::Target;
use crate::utils::error::{AppError, AppResult};

/// 系统壁纸设置能力
pub trait WallpaperApplier: Send + Sync {
    /// 失败时返回 `Apply`
    fn apply(&self, image: &DynamicImage, target: Target) -> AppResult<()>;
}

/// 把渲染结果写成 `home.png` / `lock.png` 的应用器
///
/// 供桌面环境或脚本从输出目录读取当前壁纸。
pub struct FileWallpaperApplier {
    output_dir: PathBuf,
}

impl FileWallpaperApplier {
    pub fn new(output_dir: PathBuf) -> AppResult<Self> {
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_path(&self, target: Target) -> PathBuf {
        self.output_dir.join(format!("{}.png", target.as_str()))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl WallpaperApplier for FileWallpaperApplier {
    fn apply(&self, image: &DynamicImage, target: Target) -> AppResult<()> {
        let path = self.output_path(target);
        let tmp = self.output_dir.join(format!(".{}.png.tmp", target.as_str()));

        image
            .to_rgba8()
            .save_with_format(&tmp, image::ImageFormat::Png)
            .map_err(|e| AppError::Apply(format!("{}: {}", path.display(), e)))?;

        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AppError::Apply(format!("{}: {}", path.display(), e))
        })?;

        tracing::info!("已设置{}壁纸: {}", target_label(target), path.display());
        Ok(())
    }
}

fn target_label(target: Target) -> &'static str {
    match target {
        Target::Home => "主屏",
        Target::Lock => "锁屏",
    }
}
