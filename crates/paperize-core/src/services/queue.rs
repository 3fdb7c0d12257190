//! 播放队列管理
//!
//! 每个已选相册有主屏与锁屏两个独立队列，从前往后消费；队列耗尽时用相册当前的
//! 全部壁纸重新洗牌。

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::db::{AlbumRepository, SelectedAlbumRepository};
use crate::models::{SelectedAlbum, Target, Wallpaper};
use crate::utils::error::{AppError, AppResult};

/// 下一张候选壁纸及出队后的剩余队列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub uri: String,
    pub remaining: Vec<String>,
    /// 本次是否重新洗牌
    pub rebuilt: bool,
}

pub struct QueueManager {
    albums: Arc<dyn AlbumRepository>,
    selected: Arc<dyn SelectedAlbumRepository>,
    /// None 时使用线程随机数
    seeded: Option<Mutex<StdRng>>,
}

impl QueueManager {
    pub fn new(
        albums: Arc<dyn AlbumRepository>,
        selected: Arc<dyn SelectedAlbumRepository>,
    ) -> Self {
        Self {
            albums,
            selected,
            seeded: None,
        }
    }

    /// 固定种子的洗牌顺序（用于测试）
    pub fn with_seed(
        albums: Arc<dyn AlbumRepository>,
        selected: Arc<dyn SelectedAlbumRepository>,
        seed: u64,
    ) -> Self {
        Self {
            albums,
            selected,
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    fn shuffle(&self, items: &mut [String]) {
        match &self.seeded {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|e| e.into_inner());
                items.shuffle(&mut *rng);
            }
            None => items.shuffle(&mut rand::rng()),
        }
    }

    /// 取目标队列的下一张候选
    ///
    /// 队列中已不属于相册的条目会被跳过；队列耗尽时重新洗牌。
    /// 相册没有任何壁纸时返回 `EmptyAlbum`。
    pub fn next_candidate(&self, album: &SelectedAlbum, target: Target) -> AppResult<Candidate> {
        let live: HashSet<&str> = album
            .wallpapers
            .iter()
            .map(|w| w.wallpaper_uri.as_str())
            .collect();

        let mut queue = album
            .album
            .queue(target)
            .iter()
            .filter(|uri| live.contains(uri.as_str()))
            .cloned();

        if let Some(uri) = queue.next() {
            let remaining: Vec<String> = queue.collect();
            tracing::debug!(
                "{} 队列出队: {} (剩余 {})",
                target,
                uri,
                remaining.len()
            );
            return Ok(Candidate {
                uri,
                remaining,
                rebuilt: false,
            });
        }

        let mut fresh = album.wallpaper_uris();
        if fresh.is_empty() {
            return Err(AppError::EmptyAlbum(album.name().to_string()));
        }

        self.shuffle(&mut fresh);
        let uri = fresh.remove(0);

        tracing::debug!(
            "{} 队列已耗尽，重新洗牌相册 {} ({} 张)",
            target,
            album.name(),
            fresh.len() + 1
        );

        Ok(Candidate {
            uri,
            remaining: fresh,
            rebuilt: true,
        })
    }

    /// 提交出队结果，返回更新后的已选相册
    ///
    /// 只写回 `target` 的队列；另一目标可能正由自己的工作线程推进。
    pub fn commit(
        &self,
        album: &SelectedAlbum,
        target: Target,
        remaining: Vec<String>,
    ) -> AppResult<SelectedAlbum> {
        self.selected.store_queue(album.name(), target, &remaining)?;
        Ok(album.with_queue(target, remaining))
    }

    /// 驱逐无法渲染或无法设置的壁纸
    ///
    /// 从相册壁纸集合与两个队列中永久移除；重复调用或 URI 不存在时为空操作。
    pub fn evict(&self, album: &SelectedAlbum, target: Target, uri: &str) -> AppResult<SelectedAlbum> {
        let wallpaper = album
            .find(uri)
            .cloned()
            .unwrap_or_else(|| Wallpaper::new(album.name(), uri));

        self.albums.delete_wallpaper(&wallpaper)?;
        self.selected.delete_selected_wallpaper(&wallpaper)?;

        let (next, changed) = album.without(uri);
        if changed {
            tracing::warn!("驱逐壁纸 ({}): {} / {}", target, album.name(), uri);
        }
        Ok(next)
    }
}
