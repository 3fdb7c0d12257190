//! 测试辅助：内存数据库、测试图片与记录调用的替身实现

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDateTime;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use crate::db::{AlbumRepository, Database, SelectedAlbumRepository};
use crate::events::EventSink;
use crate::models::{CreateAlbum, SelectedAlbum, Target, TransformOptions, TriggerJob};
use crate::services::applier::WallpaperApplier;
use crate::services::renderer::Renderer;
use crate::services::resolver::path_to_uri;
use crate::services::scheduler::TriggerScheduler;
use crate::utils::error::{AppError, AppResult};

pub fn test_db() -> Database {
    let db = Database::open_in_memory().expect("open in-memory database");
    db.init().expect("init schema");
    db
}

/// 创建相册并添加散图
pub fn seed_album(db: &Database, name: &str, uris: &[&str]) {
    db.create_album(&CreateAlbum {
        album_name: name.to_string(),
        display_name: None,
    })
    .expect("create album");
    let uris: Vec<String> = uris.iter().map(|u| u.to_string()).collect();
    db.add_wallpapers(name, &uris).expect("add wallpapers");
}

/// 选中相册并返回派生后的已选相册
pub fn select_album(db: &Database, name: &str) -> SelectedAlbum {
    let aww = db
        .get_album_with_wallpaper_and_folder(name)
        .expect("load album")
        .expect("album exists");
    let selected = SelectedAlbum::from_album(&aww);
    db.upsert_selected_album(&selected).expect("select album");
    selected
}

/// 写入纯色 PNG，返回其 URI
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, rgb: [u8; 3]) -> String {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb(rgb))
        .save(&path)
        .expect("write png");
    path_to_uri(&path)
}

#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(String, String)>>,
}

impl RecordingEventSink {
    pub fn events(&self) -> Vec<(String, String)> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event_name: &str, payload_json: &str) {
        self.events
            .lock()
            .unwrap()
            .push((event_name.to_string(), payload_json.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<(Target, NaiveDateTime, TriggerJob)>>,
    deferred: Mutex<Vec<(Duration, TriggerJob)>>,
    cancelled: Mutex<Vec<Target>>,
}

impl RecordingScheduler {
    pub fn scheduled(&self) -> Vec<(Target, NaiveDateTime, TriggerJob)> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn deferred(&self) -> Vec<(Duration, TriggerJob)> {
        self.deferred.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<Target> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl TriggerScheduler for RecordingScheduler {
    fn schedule_at(&self, target: Target, at: NaiveDateTime, job: TriggerJob) -> AppResult<()> {
        self.scheduled.lock().unwrap().push((target, at, job));
        Ok(())
    }

    fn dispatch_after(&self, delay: Duration, job: TriggerJob) -> AppResult<()> {
        self.deferred.lock().unwrap().push((delay, job));
        Ok(())
    }

    fn cancel(&self, target: Target) {
        self.cancelled.lock().unwrap().push(target);
    }
}

/// 返回 1x1 图片的渲染器；可指定失败的 URI
#[derive(Default)]
pub struct FakeRenderer {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, TransformOptions)>>,
}

impl FakeRenderer {
    pub fn fail_on(&self, uri: &str) {
        self.failing.lock().unwrap().insert(uri.to_string());
    }

    pub fn calls(&self) -> Vec<(String, TransformOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Renderer for FakeRenderer {
    fn render(&self, uri: &str, options: &TransformOptions) -> AppResult<DynamicImage> {
        self.calls
            .lock()
            .unwrap()
            .push((uri.to_string(), *options));
        if self.failing.lock().unwrap().contains(uri) {
            return Err(AppError::Render(uri.to_string()));
        }
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            1,
            1,
            Rgba([options.darken_percent, options.blur_percent, 0, 255]),
        )))
    }
}

/// 记录应用目标的应用器；可指定拒绝的目标
#[derive(Default)]
pub struct RecordingApplier {
    refused: Mutex<HashSet<Target>>,
    applied: Mutex<Vec<Target>>,
}

impl RecordingApplier {
    pub fn refuse(&self, target: Target) {
        self.refused.lock().unwrap().insert(target);
    }

    pub fn applied(&self) -> Vec<Target> {
        self.applied.lock().unwrap().clone()
    }
}

impl WallpaperApplier for RecordingApplier {
    fn apply(&self, _image: &DynamicImage, target: Target) -> AppResult<()> {
        if self.refused.lock().unwrap().contains(&target) {
            return Err(AppError::Apply(target.to_string()));
        }
        self.applied.lock().unwrap().push(target);
        Ok(())
    }
}
