//! 数据库 Schema 定义
//!
//! 包含所有表的 CREATE 语句和迁移脚本

/// 数据库版本
pub const SCHEMA_VERSION: i32 = 2;

/// 初始化 Schema SQL
pub const INIT_SCHEMA: &str = r#"
-- 相册表
CREATE TABLE IF NOT EXISTS albums (
    album_id            INTEGER PRIMARY KEY AUTOINCREMENT,
    initial_album_name  TEXT NOT NULL UNIQUE,
    display_name        TEXT NOT NULL,
    cover_uri           TEXT,
    home_queue          TEXT NOT NULL DEFAULT '[]',
    lock_queue          TEXT NOT NULL DEFAULT '[]',
    date_created        TEXT NOT NULL
);

-- 壁纸表（散图）
CREATE TABLE IF NOT EXISTS wallpapers (
    wallpaper_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    initial_album_name  TEXT NOT NULL REFERENCES albums(initial_album_name) ON DELETE CASCADE,
    wallpaper_uri       TEXT NOT NULL,
    wallpaper_key       TEXT NOT NULL,
    date_added          TEXT NOT NULL,
    UNIQUE (initial_album_name, wallpaper_uri)
);

-- 文件夹表
CREATE TABLE IF NOT EXISTS folders (
    folder_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    initial_album_name  TEXT NOT NULL REFERENCES albums(initial_album_name) ON DELETE CASCADE,
    folder_uri          TEXT NOT NULL,
    display_name        TEXT,
    cover_uri           TEXT,
    wallpapers          TEXT NOT NULL DEFAULT '[]',
    date_modified       TEXT NOT NULL,
    UNIQUE (initial_album_name, folder_uri)
);

-- 已选相册表
CREATE TABLE IF NOT EXISTS selected_albums (
    initial_album_name  TEXT PRIMARY KEY REFERENCES albums(initial_album_name) ON DELETE CASCADE,
    date_selected       TEXT NOT NULL
);

-- 数据库版本表
CREATE TABLE IF NOT EXISTS schema_version (
    version         INTEGER PRIMARY KEY,
    applied_at      TEXT NOT NULL
);

-- 索引
CREATE INDEX IF NOT EXISTS idx_wallpapers_album ON wallpapers(initial_album_name);
CREATE INDEX IF NOT EXISTS idx_folders_album ON folders(initial_album_name);
"#;

/// 数据库迁移
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// 迁移列表（按版本号升序）
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 2,
    description: "添加已选相册表",
    sql: r#"
        CREATE TABLE IF NOT EXISTS selected_albums (
            initial_album_name  TEXT PRIMARY KEY REFERENCES albums(initial_album_name) ON DELETE CASCADE,
            date_selected       TEXT NOT NULL
        );
    "#,
}];
