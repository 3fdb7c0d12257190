//! 相册数据访问层

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    Album, AlbumWithCount, AlbumWithWallpaper, CreateAlbum, Folder, Target, Wallpaper,
};
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;
use super::repository::AlbumRepository;

/// JSON 列表列解析；损坏时按空列表处理
pub(crate) fn parse_uri_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("无法解析 URI 列表，按空列表处理: {}", e);
        Vec::new()
    })
}

pub(crate) fn encode_uri_list(uris: &[String]) -> AppResult<String> {
    Ok(serde_json::to_string(uris)?)
}

/// 从数据库行映射到 Album
fn row_to_album(row: &Row<'_>) -> rusqlite::Result<Album> {
    let home_queue: String = row.get("home_queue")?;
    let lock_queue: String = row.get("lock_queue")?;

    Ok(Album {
        album_id: row.get("album_id")?,
        initial_album_name: row.get("initial_album_name")?,
        display_name: row.get("display_name")?,
        cover_uri: row.get("cover_uri")?,
        home_wallpapers_in_queue: parse_uri_list(&home_queue),
        lock_wallpapers_in_queue: parse_uri_list(&lock_queue),
        date_created: row.get("date_created")?,
    })
}

fn row_to_wallpaper(row: &Row<'_>) -> rusqlite::Result<Wallpaper> {
    Ok(Wallpaper {
        wallpaper_id: row.get("wallpaper_id")?,
        initial_album_name: row.get("initial_album_name")?,
        wallpaper_uri: row.get("wallpaper_uri")?,
        key: row.get("wallpaper_key")?,
        date_added: row.get("date_added")?,
    })
}

fn row_to_folder(row: &Row<'_>) -> rusqlite::Result<Folder> {
    let wallpapers: String = row.get("wallpapers")?;

    Ok(Folder {
        folder_id: row.get("folder_id")?,
        initial_album_name: row.get("initial_album_name")?,
        folder_uri: row.get("folder_uri")?,
        display_name: row.get("display_name")?,
        cover_uri: row.get("cover_uri")?,
        wallpapers: parse_uri_list(&wallpapers),
        date_modified: row.get("date_modified")?,
    })
}

pub(crate) fn load_album(conn: &Connection, album_name: &str) -> AppResult<Option<Album>> {
    let album = conn
        .query_row(
            "SELECT * FROM albums WHERE initial_album_name = ?1",
            params![album_name],
            row_to_album,
        )
        .optional()?;
    Ok(album)
}

fn load_wallpapers(conn: &Connection, album_name: &str) -> AppResult<Vec<Wallpaper>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM wallpapers WHERE initial_album_name = ?1 ORDER BY wallpaper_id",
    )?;
    let wallpapers = stmt
        .query_map(params![album_name], row_to_wallpaper)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(wallpapers)
}

fn load_folders(conn: &Connection, album_name: &str) -> AppResult<Vec<Folder>> {
    let mut stmt =
        conn.prepare("SELECT * FROM folders WHERE initial_album_name = ?1 ORDER BY folder_id")?;
    let folders = stmt
        .query_map(params![album_name], row_to_folder)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(folders)
}

/// 在同一连接上读取相册及其全部内容
pub(crate) fn load_album_with_wallpaper(
    conn: &Connection,
    album_name: &str,
) -> AppResult<Option<AlbumWithWallpaper>> {
    let Some(album) = load_album(conn, album_name)? else {
        return Ok(None);
    };

    Ok(Some(AlbumWithWallpaper {
        wallpapers: load_wallpapers(conn, album_name)?,
        folders: load_folders(conn, album_name)?,
        album,
    }))
}

/// 写回相册的两个队列
pub(crate) fn store_queues(
    conn: &Connection,
    album_name: &str,
    home_queue: &[String],
    lock_queue: &[String],
) -> AppResult<()> {
    conn.execute(
        "UPDATE albums SET home_queue = ?1, lock_queue = ?2 WHERE initial_album_name = ?3",
        params![
            encode_uri_list(home_queue)?,
            encode_uri_list(lock_queue)?,
            album_name
        ],
    )?;
    Ok(())
}

/// 只写回一个目标的队列，另一目标的队列列不受影响
pub(crate) fn store_queue(
    conn: &Connection,
    album_name: &str,
    target: Target,
    queue: &[String],
) -> AppResult<()> {
    let sql = match target {
        Target::Home => "UPDATE albums SET home_queue = ?1 WHERE initial_album_name = ?2",
        Target::Lock => "UPDATE albums SET lock_queue = ?1 WHERE initial_album_name = ?2",
    };
    conn.execute(sql, params![encode_uri_list(queue)?, album_name])?;
    Ok(())
}

/// 从相册的散图、文件夹缓存与队列中移除一个 URI
fn remove_uri(conn: &Connection, album_name: &str, uri: &str) -> AppResult<()> {
    conn.execute(
        "DELETE FROM wallpapers WHERE initial_album_name = ?1 AND wallpaper_uri = ?2",
        params![album_name, uri],
    )?;

    for mut folder in load_folders(conn, album_name)? {
        let before = folder.wallpapers.len();
        folder.wallpapers.retain(|u| u != uri);
        let cover_stale = folder.cover_uri.as_deref() == Some(uri);
        if folder.wallpapers.len() == before && !cover_stale {
            continue;
        }
        if cover_stale {
            folder.cover_uri = folder.wallpapers.first().cloned();
        }
        write_folder(conn, &folder)?;
    }

    if let Some(mut album) = load_album(conn, album_name)? {
        album.home_wallpapers_in_queue.retain(|u| u != uri);
        album.lock_wallpapers_in_queue.retain(|u| u != uri);
        store_queues(
            conn,
            album_name,
            &album.home_wallpapers_in_queue,
            &album.lock_wallpapers_in_queue,
        )?;
        if album.cover_uri.as_deref() == Some(uri) {
            conn.execute(
                "UPDATE albums SET cover_uri = NULL WHERE initial_album_name = ?1",
                params![album_name],
            )?;
        }
    }

    Ok(())
}

fn write_folder(conn: &Connection, folder: &Folder) -> AppResult<()> {
    conn.execute(
        r#"
        UPDATE folders
        SET display_name = ?1, cover_uri = ?2, wallpapers = ?3, date_modified = ?4
        WHERE initial_album_name = ?5 AND folder_uri = ?6
        "#,
        params![
            folder.display_name,
            folder.cover_uri,
            encode_uri_list(&folder.wallpapers)?,
            folder.date_modified,
            folder.initial_album_name,
            folder.folder_uri,
        ],
    )?;
    Ok(())
}

impl Database {
    /// 创建相册
    pub fn create_album(&self, input: &CreateAlbum) -> AppResult<Album> {
        let name = input.album_name.trim();
        if name.is_empty() {
            return Err(AppError::Config("相册名不能为空".to_string()));
        }

        let conn = self.connection()?;
        if load_album(&conn, name)?.is_some() {
            return Err(AppError::Config(format!("相册已存在: {}", name)));
        }

        let mut album = Album::new(name.to_string());
        if let Some(display_name) = &input.display_name {
            album.display_name = display_name.clone();
        }

        conn.execute(
            r#"
            INSERT INTO albums (initial_album_name, display_name, cover_uri, home_queue, lock_queue, date_created)
            VALUES (?1, ?2, NULL, '[]', '[]', ?3)
            "#,
            params![album.initial_album_name, album.display_name, album.date_created],
        )?;
        album.album_id = conn.last_insert_rowid();

        tracing::info!("创建相册: {} (id={})", album.initial_album_name, album.album_id);
        Ok(album)
    }

    /// 根据名称获取相册
    pub fn get_album(&self, album_name: &str) -> AppResult<Option<Album>> {
        let conn = self.connection()?;
        load_album(&conn, album_name)
    }

    /// 获取所有相册（带数量）
    pub fn get_all_albums(&self) -> AppResult<Vec<AlbumWithCount>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT * FROM albums ORDER BY date_created, album_id")?;
        let albums = stmt
            .query_map([], row_to_album)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(albums.len());
        for album in albums {
            let aww = AlbumWithWallpaper {
                wallpapers: load_wallpapers(&conn, &album.initial_album_name)?,
                folders: load_folders(&conn, &album.initial_album_name)?,
                album,
            };
            result.push(AlbumWithCount {
                wallpaper_count: aww.effective_wallpapers().len(),
                folder_count: aww.folders.len(),
                album: aww.album,
            });
        }
        Ok(result)
    }

    /// 添加散图，返回新增数量（已存在的 URI 跳过）
    pub fn add_wallpapers(&self, album_name: &str, uris: &[String]) -> AppResult<usize> {
        self.transaction(|conn| {
            let album = load_album(conn, album_name)?
                .ok_or_else(|| AppError::Config(format!("相册不存在: {}", album_name)))?;

            let mut added = 0;
            for uri in uris {
                let wallpaper = Wallpaper::new(album_name, uri);
                added += conn.execute(
                    r#"
                    INSERT OR IGNORE INTO wallpapers (initial_album_name, wallpaper_uri, wallpaper_key, date_added)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![
                        wallpaper.initial_album_name,
                        wallpaper.wallpaper_uri,
                        wallpaper.key,
                        wallpaper.date_added
                    ],
                )?;
            }

            if album.cover_uri.is_none() {
                if let Some(first) = uris.first() {
                    conn.execute(
                        "UPDATE albums SET cover_uri = ?1 WHERE initial_album_name = ?2",
                        params![first, album_name],
                    )?;
                }
            }

            tracing::debug!("相册 {} 新增 {} 张壁纸", album_name, added);
            Ok(added)
        })
    }

    /// 添加或更新文件夹
    pub fn add_folder(
        &self,
        album_name: &str,
        folder_uri: &str,
        display_name: Option<String>,
        wallpapers: Vec<String>,
    ) -> AppResult<Folder> {
        let conn = self.connection()?;
        if load_album(&conn, album_name)?.is_none() {
            return Err(AppError::Config(format!("相册不存在: {}", album_name)));
        }

        let mut folder = Folder::new(album_name, folder_uri, wallpapers);
        folder.display_name = display_name;

        conn.execute(
            r#"
            INSERT INTO folders (initial_album_name, folder_uri, display_name, cover_uri, wallpapers, date_modified)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(initial_album_name, folder_uri) DO UPDATE SET
                display_name = excluded.display_name,
                cover_uri = excluded.cover_uri,
                wallpapers = excluded.wallpapers,
                date_modified = excluded.date_modified
            "#,
            params![
                folder.initial_album_name,
                folder.folder_uri,
                folder.display_name,
                folder.cover_uri,
                encode_uri_list(&folder.wallpapers)?,
                folder.date_modified,
            ],
        )?;

        folder.folder_id = conn.query_row(
            "SELECT folder_id FROM folders WHERE initial_album_name = ?1 AND folder_uri = ?2",
            params![album_name, folder_uri],
            |row| row.get(0),
        )?;

        if let Some(cover) = &folder.cover_uri {
            conn.execute(
                "UPDATE albums SET cover_uri = ?1 WHERE initial_album_name = ?2 AND cover_uri IS NULL",
                params![cover, album_name],
            )?;
        }

        Ok(folder)
    }

    /// 按名称删除相册，返回是否存在
    pub fn delete_album_by_name(&self, album_name: &str) -> AppResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute(
            "DELETE FROM albums WHERE initial_album_name = ?1",
            params![album_name],
        )?;
        if rows > 0 {
            tracing::info!("删除相册: {}", album_name);
        }
        Ok(rows > 0)
    }
}

impl AlbumRepository for Database {
    fn get_albums_with_wallpaper_and_folder(&self) -> AppResult<Vec<AlbumWithWallpaper>> {
        let conn = self.connection()?;
        let names: Vec<String> = conn
            .prepare("SELECT initial_album_name FROM albums ORDER BY date_created, album_id")?
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(names.len());
        for name in names {
            if let Some(aww) = load_album_with_wallpaper(&conn, &name)? {
                result.push(aww);
            }
        }
        Ok(result)
    }

    fn get_album_with_wallpaper_and_folder(
        &self,
        album_name: &str,
    ) -> AppResult<Option<AlbumWithWallpaper>> {
        let conn = self.connection()?;
        load_album_with_wallpaper(&conn, album_name)
    }

    fn delete_wallpaper(&self, wallpaper: &Wallpaper) -> AppResult<()> {
        self.transaction(|conn| {
            remove_uri(conn, &wallpaper.initial_album_name, &wallpaper.wallpaper_uri)
        })
    }

    fn delete_wallpaper_list(&self, wallpapers: &[Wallpaper]) -> AppResult<()> {
        if wallpapers.is_empty() {
            return Ok(());
        }
        self.transaction(|conn| {
            for wallpaper in wallpapers {
                remove_uri(conn, &wallpaper.initial_album_name, &wallpaper.wallpaper_uri)?;
            }
            Ok(())
        })
    }

    fn delete_folder(&self, folder: &Folder) -> AppResult<()> {
        let conn = self.connection()?;
        conn.execute(
            "DELETE FROM folders WHERE initial_album_name = ?1 AND folder_uri = ?2",
            params![folder.initial_album_name, folder.folder_uri],
        )?;
        Ok(())
    }

    fn update_folder(&self, folder: &Folder) -> AppResult<()> {
        let conn = self.connection()?;
        write_folder(&conn, folder)
    }

    fn delete_album(&self, album: &Album) -> AppResult<()> {
        self.delete_album_by_name(&album.initial_album_name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::wallpaper_key;
    use crate::testing::test_db;

    fn uris(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_album_assigns_id_and_rejects_duplicates() {
        let db = test_db();
        let album = db
            .create_album(&CreateAlbum {
                album_name: "风景".to_string(),
                display_name: None,
            })
            .unwrap();
        assert!(album.album_id > 0);

        let err = db
            .create_album(&CreateAlbum {
                album_name: "风景".to_string(),
                display_name: None,
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_add_wallpapers_skips_existing() {
        let db = test_db();
        db.create_album(&CreateAlbum {
            album_name: "a".to_string(),
            display_name: None,
        })
        .unwrap();

        assert_eq!(db.add_wallpapers("a", &uris(&["/1.jpg", "/2.jpg"])).unwrap(), 2);
        assert_eq!(db.add_wallpapers("a", &uris(&["/2.jpg", "/3.jpg"])).unwrap(), 1);

        let aww = db.get_album_with_wallpaper_and_folder("a").unwrap().unwrap();
        assert_eq!(aww.wallpapers.len(), 3);
        assert_eq!(aww.album.cover_uri.as_deref(), Some("/1.jpg"));
        assert_eq!(aww.wallpapers[0].key, wallpaper_key("a", "/1.jpg"));
    }

    #[test]
    fn test_delete_wallpaper_removes_every_reference() {
        let db = test_db();
        db.create_album(&CreateAlbum {
            album_name: "a".to_string(),
            display_name: None,
        })
        .unwrap();
        db.add_wallpapers("a", &uris(&["/1.jpg"])).unwrap();
        db.add_folder("a", "/dir", None, uris(&["/1.jpg", "/dir/2.jpg"]))
            .unwrap();
        {
            let conn = db.connection().unwrap();
            store_queues(&conn, "a", &uris(&["/1.jpg", "/dir/2.jpg"]), &uris(&["/1.jpg"]))
                .unwrap();
        }

        let target = Wallpaper::new("a", "/1.jpg");
        db.delete_wallpaper(&target).unwrap();
        // 重复删除是空操作
        db.delete_wallpaper(&target).unwrap();

        let aww = db.get_album_with_wallpaper_and_folder("a").unwrap().unwrap();
        assert!(aww.wallpapers.is_empty());
        assert_eq!(aww.folders[0].wallpapers, uris(&["/dir/2.jpg"]));
        assert_eq!(aww.folders[0].cover_uri.as_deref(), Some("/dir/2.jpg"));
        assert_eq!(aww.album.home_wallpapers_in_queue, uris(&["/dir/2.jpg"]));
        assert!(aww.album.lock_wallpapers_in_queue.is_empty());
        assert!(aww.album.cover_uri.is_none());
    }

    #[test]
    fn test_delete_album_cascades() {
        let db = test_db();
        let album = db
            .create_album(&CreateAlbum {
                album_name: "a".to_string(),
                display_name: Some("Album A".to_string()),
            })
            .unwrap();
        db.add_wallpapers("a", &uris(&["/1.jpg"])).unwrap();
        db.add_folder("a", "/dir", None, vec![]).unwrap();

        db.delete_album(&album).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.album_count, 0);
        assert_eq!(stats.wallpaper_count, 0);
        assert_eq!(stats.folder_count, 0);
    }

    #[test]
    fn test_update_folder_and_counts() {
        let db = test_db();
        db.create_album(&CreateAlbum {
            album_name: "a".to_string(),
            display_name: None,
        })
        .unwrap();
        let mut folder = db.add_folder("a", "/dir", None, uris(&["/dir/1.jpg"])).unwrap();

        folder.wallpapers = uris(&["/dir/1.jpg", "/dir/2.jpg"]);
        db.update_folder(&folder).unwrap();

        let albums = db.get_all_albums().unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].wallpaper_count, 2);
        assert_eq!(albums[0].folder_count, 1);
    }
}
