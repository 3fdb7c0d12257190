//! 已选相册数据访问层
//!
//! 已选相册只记录相册名与选中时间；有效壁纸集合在读取时由散图与文件夹派生，
//! 队列保存在 `albums` 表上。

use rusqlite::params;

use crate::models::{now_iso8601, SelectedAlbum, Target, Wallpaper};
use crate::utils::error::AppResult;

use super::album_dao::{load_album, load_album_with_wallpaper, store_queue, store_queues};
use super::connection::Database;
use super::repository::SelectedAlbumRepository;

impl Database {
    /// 相册是否处于选中状态
    pub fn is_album_selected(&self, album_name: &str) -> AppResult<bool> {
        let conn = self.connection()?;
        let selected: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM selected_albums WHERE initial_album_name = ?1",
            params![album_name],
            |row| row.get(0),
        )?;
        Ok(selected)
    }
}

impl SelectedAlbumRepository for Database {
    fn get_selected_albums(&self) -> AppResult<Vec<SelectedAlbum>> {
        let conn = self.connection()?;
        let names: Vec<String> = conn
            .prepare("SELECT initial_album_name FROM selected_albums ORDER BY date_selected, rowid")?
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(names.len());
        for name in names {
            if let Some(aww) = load_album_with_wallpaper(&conn, &name)? {
                result.push(SelectedAlbum::from_album(&aww));
            }
        }
        Ok(result)
    }

    fn get_selected_album(&self, album_name: &str) -> AppResult<Option<SelectedAlbum>> {
        let conn = self.connection()?;
        let selected: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM selected_albums WHERE initial_album_name = ?1",
            params![album_name],
            |row| row.get(0),
        )?;
        if !selected {
            return Ok(None);
        }

        Ok(load_album_with_wallpaper(&conn, album_name)?.map(|aww| SelectedAlbum::from_album(&aww)))
    }

    fn upsert_selected_album(&self, selected: &SelectedAlbum) -> AppResult<()> {
        self.transaction(|conn| {
            conn.execute(
                r#"
                INSERT INTO selected_albums (initial_album_name, date_selected)
                VALUES (?1, ?2)
                ON CONFLICT(initial_album_name) DO NOTHING
                "#,
                params![selected.name(), now_iso8601()],
            )?;
            store_queues(
                conn,
                selected.name(),
                &selected.album.home_wallpapers_in_queue,
                &selected.album.lock_wallpapers_in_queue,
            )
        })
    }

    fn store_queue(&self, album_name: &str, target: Target, queue: &[String]) -> AppResult<()> {
        let conn = self.connection()?;
        store_queue(&conn, album_name, target, queue)
    }

    fn prune_queues(&self, album_name: &str) -> AppResult<usize> {
        self.transaction(|conn| {
            let Some(aww) = load_album_with_wallpaper(conn, album_name)? else {
                return Ok(0);
            };
            let mut selected = SelectedAlbum::from_album(&aww);
            let pruned = selected.prune_queues();
            if pruned > 0 {
                store_queues(
                    conn,
                    album_name,
                    &selected.album.home_wallpapers_in_queue,
                    &selected.album.lock_wallpapers_in_queue,
                )?;
            }
            Ok(pruned)
        })
    }

    fn delete_selected_wallpaper(&self, wallpaper: &Wallpaper) -> AppResult<()> {
        self.transaction(|conn| {
            let Some(mut album) = load_album(conn, &wallpaper.initial_album_name)? else {
                return Ok(());
            };
            let uri = &wallpaper.wallpaper_uri;
            album.home_wallpapers_in_queue.retain(|u| u != uri);
            album.lock_wallpapers_in_queue.retain(|u| u != uri);
            store_queues(
                conn,
                &album.initial_album_name,
                &album.home_wallpapers_in_queue,
                &album.lock_wallpapers_in_queue,
            )
        })
    }

    fn cascade_delete_album(&self, album_name: &str) -> AppResult<()> {
        self.transaction(|conn| {
            conn.execute(
                "DELETE FROM selected_albums WHERE initial_album_name = ?1",
                params![album_name],
            )?;
            store_queues(conn, album_name, &[], &[])
        })?;
        tracing::info!("取消选中相册: {}", album_name);
        Ok(())
    }

    fn delete_all(&self) -> AppResult<()> {
        self.transaction(|conn| {
            conn.execute(
                r#"
                UPDATE albums SET home_queue = '[]', lock_queue = '[]'
                WHERE initial_album_name IN (SELECT initial_album_name FROM selected_albums)
                "#,
                [],
            )?;
            conn.execute("DELETE FROM selected_albums", [])?;
            Ok(())
        })?;
        tracing::info!("已清空全部选中相册");
        Ok(())
    }
}
