//! 相册刷新服务
//!
//! 维护性遍历：校验所有壁纸 URI、重新扫描文件夹、修复封面、删除空相册，
//! 最后重新派生已选相册的壁纸集合。

use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use rayon::prelude::*;
use serde::Serialize;

use crate::db::{AlbumRepository, SelectedAlbumRepository};
use crate::models::{now_iso8601, Folder, Target, Wallpaper};
use crate::utils::error::AppResult;

use super::resolver::ContentResolver;
use super::scanner::FolderScanner;
use super::scheduler::TriggerScheduler;

/// 一次刷新的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub wallpapers_removed: usize,
    pub folders_removed: usize,
    pub folders_rescanned: usize,
    pub albums_deleted: Vec<String>,
    pub queue_entries_pruned: usize,
    /// 已选相册因内容为空被全部清除
    pub selection_cleared: bool,
}

pub struct AlbumRefresher {
    albums: Arc<dyn AlbumRepository>,
    selected: Arc<dyn SelectedAlbumRepository>,
    resolver: Arc<dyn ContentResolver>,
    scanner: Arc<dyn FolderScanner>,
    scheduler: Option<Arc<dyn TriggerScheduler>>,
}

impl AlbumRefresher {
    pub fn new(
        albums: Arc<dyn AlbumRepository>,
        selected: Arc<dyn SelectedAlbumRepository>,
        resolver: Arc<dyn ContentResolver>,
        scanner: Arc<dyn FolderScanner>,
    ) -> Self {
        Self {
            albums,
            selected,
            resolver,
            scanner,
            scheduler: None,
        }
    }

    /// 清除选中时同时取消定时触发
    pub fn with_scheduler(mut self, scheduler: Arc<dyn TriggerScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn refresh(&self) -> AppResult<RefreshReport> {
        let mut report = RefreshReport::default();

        let had_selection = !self.selected.get_selected_albums()?.is_empty();

        for aww in self.albums.get_albums_with_wallpaper_and_folder()? {
            let invalid: Vec<Wallpaper> = aww
                .wallpapers
                .par_iter()
                .filter(|w| !self.resolver.exists(&w.wallpaper_uri))
                .cloned()
                .collect();
            if !invalid.is_empty() {
                tracing::info!(
                    "相册 {} 删除 {} 张无效壁纸",
                    aww.album.initial_album_name,
                    invalid.len()
                );
                self.albums.delete_wallpaper_list(&invalid)?;
                report.wallpapers_removed += invalid.len();
            }

            for folder in &aww.folders {
                if self.resolver.resolve_dir(&folder.folder_uri).is_err() {
                    tracing::info!("文件夹已不存在，删除: {}", folder.folder_uri);
                    self.albums.delete_folder(folder)?;
                    report.folders_removed += 1;
                    continue;
                }

                match self.scanner.list_wallpapers(&folder.folder_uri) {
                    Ok(fresh) => {
                        let updated = self.rescanned(folder, fresh);
                        self.albums.update_folder(&updated)?;
                        report.folders_rescanned += 1;
                    }
                    Err(e) => {
                        tracing::warn!("重新扫描文件夹失败 {}: {}", folder.folder_uri, e);
                    }
                }
            }
        }

        // 以刷新后的内容判断空相册
        for aww in self.albums.get_albums_with_wallpaper_and_folder()? {
            if aww.is_empty() {
                tracing::info!("删除空相册: {}", aww.album.initial_album_name);
                self.albums.delete_album(&aww.album)?;
                report.albums_deleted.push(aww.album.initial_album_name);
            }
        }

        let mut live_selection = false;
        for selected in self.selected.get_selected_albums()? {
            report.queue_entries_pruned += self.selected.prune_queues(selected.name())?;
            if !selected.wallpapers.is_empty() {
                live_selection = true;
            }
        }

        if had_selection && !live_selection {
            tracing::warn!("已选相册已没有可用壁纸，停止轮换");
            self.selected.delete_all()?;
            if let Some(scheduler) = &self.scheduler {
                for target in Target::BOTH {
                    scheduler.cancel(target);
                }
            }
            report.selection_cleared = true;
        }

        tracing::info!(
            "刷新完成: 删除 {} 张壁纸, {} 个文件夹, {} 个相册, 修剪 {} 个队列条目",
            report.wallpapers_removed,
            report.folders_removed,
            report.albums_deleted.len(),
            report.queue_entries_pruned
        );

        Ok(report)
    }

    /// 用新的扫描结果更新文件夹；旧封面仍可用则保留，否则随机挑选
    fn rescanned(&self, folder: &Folder, fresh: Vec<String>) -> Folder {
        let listed: HashSet<&str> = fresh.iter().map(String::as_str).collect();

        let cover = folder
            .cover_uri
            .as_deref()
            .filter(|cover| listed.contains(cover) && self.resolver.exists(cover))
            .map(str::to_string)
            .or_else(|| fresh.choose(&mut rand::rng()).cloned());

        Folder {
            cover_uri: cover,
            wallpapers: fresh,
            date_modified: now_iso8601(),
            ..folder.clone()
        }
    }
}
