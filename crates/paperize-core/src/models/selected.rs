//! 已选相册数据模型

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Album, AlbumWithWallpaper, Target, Wallpaper};

/// 当前作为轮换来源的相册
///
/// `wallpapers` 是选中时派生的有效壁纸集合（散图 + 文件夹壁纸）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedAlbum {
    pub album: Album,
    pub wallpapers: Vec<Wallpaper>,
}

impl SelectedAlbum {
    pub fn from_album(aww: &AlbumWithWallpaper) -> Self {
        Self {
            album: aww.album.clone(),
            wallpapers: aww.effective_wallpapers(),
        }
    }

    pub fn name(&self) -> &str {
        &self.album.initial_album_name
    }

    /// 全部壁纸 URI（保持顺序）
    pub fn wallpaper_uris(&self) -> Vec<String> {
        self.wallpapers.iter().map(|w| w.wallpaper_uri.clone()).collect()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.wallpapers.iter().any(|w| w.wallpaper_uri == uri)
    }

    pub fn find(&self, uri: &str) -> Option<&Wallpaper> {
        self.wallpapers.iter().find(|w| w.wallpaper_uri == uri)
    }

    /// 替换目标队列，返回新的副本
    pub fn with_queue(&self, target: Target, queue: Vec<String>) -> Self {
        let mut next = self.clone();
        *next.album.queue_mut(target) = queue;
        next
    }

    /// 从壁纸集合与两个队列中移除指定 URI
    ///
    /// 返回是否有任何改动；对不存在的 URI 是空操作。
    pub fn without(&self, uri: &str) -> (Self, bool) {
        let mut next = self.clone();
        let before = (
            next.wallpapers.len(),
            next.album.home_wallpapers_in_queue.len(),
            next.album.lock_wallpapers_in_queue.len(),
        );
        next.wallpapers.retain(|w| w.wallpaper_uri != uri);
        next.album.home_wallpapers_in_queue.retain(|u| u != uri);
        next.album.lock_wallpapers_in_queue.retain(|u| u != uri);
        let after = (
            next.wallpapers.len(),
            next.album.home_wallpapers_in_queue.len(),
            next.album.lock_wallpapers_in_queue.len(),
        );
        (next, before != after)
    }

    /// 剔除队列中不属于当前壁纸集合的条目，返回被剔除的数量
    pub fn prune_queues(&mut self) -> usize {
        let live: HashSet<&str> = self.wallpapers.iter().map(|w| w.wallpaper_uri.as_str()).collect();
        let before = self.album.home_wallpapers_in_queue.len() + self.album.lock_wallpapers_in_queue.len();
        self.album.home_wallpapers_in_queue.retain(|u| live.contains(u.as_str()));
        self.album.lock_wallpapers_in_queue.retain(|u| live.contains(u.as_str()));
        before - (self.album.home_wallpapers_in_queue.len() + self.album.lock_wallpapers_in_queue.len())
    }
}
