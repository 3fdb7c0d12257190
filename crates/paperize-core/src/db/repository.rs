//! 存储能力接口
//!
//! 轮换引擎只通过这两个 trait 访问持久化数据，`Database` 是默认实现。

use crate::models::{Album, AlbumWithWallpaper, Folder, SelectedAlbum, Target, Wallpaper};
use crate::utils::error::AppResult;

/// 相册 / 文件夹 / 壁纸存储
pub trait AlbumRepository: Send + Sync {
    /// 全部相册及其散图与文件夹
    fn get_albums_with_wallpaper_and_folder(&self) -> AppResult<Vec<AlbumWithWallpaper>>;

    /// 单个相册及其内容
    fn get_album_with_wallpaper_and_folder(
        &self,
        album_name: &str,
    ) -> AppResult<Option<AlbumWithWallpaper>>;

    /// 删除壁纸：散图行、该相册所有文件夹缓存列表以及两个队列中的引用
    fn delete_wallpaper(&self, wallpaper: &Wallpaper) -> AppResult<()>;

    fn delete_wallpaper_list(&self, wallpapers: &[Wallpaper]) -> AppResult<()>;

    fn delete_folder(&self, folder: &Folder) -> AppResult<()>;

    /// 按 (相册, 文件夹 URI) 更新文件夹的缓存内容
    fn update_folder(&self, folder: &Folder) -> AppResult<()>;

    /// 删除相册，级联删除其内容与选中状态
    fn delete_album(&self, album: &Album) -> AppResult<()>;
}

/// 已选相册存储
pub trait SelectedAlbumRepository: Send + Sync {
    /// 全部已选相册（按选中时间排序），壁纸集合在读取时派生
    fn get_selected_albums(&self) -> AppResult<Vec<SelectedAlbum>>;

    fn get_selected_album(&self, album_name: &str) -> AppResult<Option<SelectedAlbum>>;

    /// 标记为已选并写回两个队列
    fn upsert_selected_album(&self, selected: &SelectedAlbum) -> AppResult<()>;

    /// 只写回一个目标的队列
    fn store_queue(&self, album_name: &str, target: Target, queue: &[String]) -> AppResult<()>;

    /// 按当前内容剔除两个队列中的失效条目，返回剔除数量
    fn prune_queues(&self, album_name: &str) -> AppResult<usize>;

    /// 从已选相册的两个队列中移除壁纸
    fn delete_selected_wallpaper(&self, wallpaper: &Wallpaper) -> AppResult<()>;

    /// 取消选中并清空该相册的队列
    fn cascade_delete_album(&self, album_name: &str) -> AppResult<()>;

    /// 取消全部选中
    fn delete_all(&self) -> AppResult<()>;
}
