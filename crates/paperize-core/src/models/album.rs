//! 相册 / 文件夹 / 壁纸数据模型

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use super::Target;

/// 相册
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    /// 相册ID
    pub album_id: i64,
    /// 创建时的相册名（选中后不可变，作为逻辑标识）
    pub initial_album_name: String,
    /// 显示名
    pub display_name: String,
    /// 封面
    pub cover_uri: Option<String>,
    /// 主屏播放队列（从前往后消费）
    pub home_wallpapers_in_queue: Vec<String>,
    /// 锁屏播放队列
    pub lock_wallpapers_in_queue: Vec<String>,
    /// 创建时间
    pub date_created: String,
}

impl Album {
    /// 创建新相册
    pub fn new(initial_album_name: String) -> Self {
        Self {
            album_id: 0,
            display_name: initial_album_name.clone(),
            initial_album_name,
            cover_uri: None,
            home_wallpapers_in_queue: Vec::new(),
            lock_wallpapers_in_queue: Vec::new(),
            date_created: super::now_iso8601(),
        }
    }

    /// 获取目标的播放队列
    pub fn queue(&self, target: Target) -> &[String] {
        match target {
            Target::Home => &self.home_wallpapers_in_queue,
            Target::Lock => &self.lock_wallpapers_in_queue,
        }
    }

    /// 获取目标的播放队列（可变）
    pub fn queue_mut(&mut self, target: Target) -> &mut Vec<String> {
        match target {
            Target::Home => &mut self.home_wallpapers_in_queue,
            Target::Lock => &mut self.lock_wallpapers_in_queue,
        }
    }
}

/// 用于创建新相册的输入结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlbum {
    pub album_name: String,
    pub display_name: Option<String>,
}

/// 单张壁纸
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallpaper {
    /// 行ID（创建时分配；文件夹派生的壁纸为 0）
    pub wallpaper_id: i64,
    /// 所属相册
    pub initial_album_name: String,
    /// 内容定位符
    pub wallpaper_uri: String,
    /// 相册内稳定键
    pub key: String,
    /// 添加时间
    pub date_added: String,
}

impl Wallpaper {
    pub fn new(initial_album_name: &str, wallpaper_uri: &str) -> Self {
        Self {
            wallpaper_id: 0,
            initial_album_name: initial_album_name.to_string(),
            wallpaper_uri: wallpaper_uri.to_string(),
            key: wallpaper_key(initial_album_name, wallpaper_uri),
            date_added: super::now_iso8601(),
        }
    }
}

/// 由相册名与 URI 派生壁纸键
///
/// 在同一相册内唯一；不同相册中的同一 URI 得到不同的键。
pub fn wallpaper_key(album_name: &str, wallpaper_uri: &str) -> String {
    let mut buf = Vec::with_capacity(album_name.len() + wallpaper_uri.len() + 1);
    buf.extend_from_slice(album_name.as_bytes());
    buf.push(0);
    buf.extend_from_slice(wallpaper_uri.as_bytes());
    format!("{:016x}", xxh3_64(&buf))
}

/// 文件夹
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub folder_id: i64,
    pub initial_album_name: String,
    pub folder_uri: String,
    pub display_name: Option<String>,
    /// 缓存的封面
    pub cover_uri: Option<String>,
    /// 缓存的壁纸列表，使用前需要刷新
    pub wallpapers: Vec<String>,
    pub date_modified: String,
}

impl Folder {
    pub fn new(initial_album_name: &str, folder_uri: &str, wallpapers: Vec<String>) -> Self {
        Self {
            folder_id: 0,
            initial_album_name: initial_album_name.to_string(),
            folder_uri: folder_uri.to_string(),
            display_name: None,
            cover_uri: wallpapers.first().cloned(),
            wallpapers,
            date_modified: super::now_iso8601(),
        }
    }
}

/// 相册及其全部内容
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumWithWallpaper {
    pub album: Album,
    pub wallpapers: Vec<Wallpaper>,
    pub folders: Vec<Folder>,
}

impl AlbumWithWallpaper {
    /// 有效壁纸集合：散图 + 文件夹壁纸（按 URI 去重，保持顺序）
    pub fn effective_wallpapers(&self) -> Vec<Wallpaper> {
        let name = &self.album.initial_album_name;
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        for wallpaper in &self.wallpapers {
            if seen.insert(wallpaper.wallpaper_uri.clone()) {
                result.push(wallpaper.clone());
            }
        }
        for folder in &self.folders {
            for uri in &folder.wallpapers {
                if seen.insert(uri.clone()) {
                    let mut wallpaper = Wallpaper::new(name, uri);
                    wallpaper.date_added = folder.date_modified.clone();
                    result.push(wallpaper);
                }
            }
        }

        result
    }

    /// 散图与文件夹都为空
    pub fn is_empty(&self) -> bool {
        self.wallpapers.is_empty() && self.folders.iter().all(|f| f.wallpapers.is_empty())
    }
}

/// 带壁纸数量的相册
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumWithCount {
    #[serde(flatten)]
    pub album: Album,
    pub wallpaper_count: usize,
    pub folder_count: usize,
}
