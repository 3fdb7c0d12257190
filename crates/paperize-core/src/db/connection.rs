//! 相册库连接
//!
//! 单个 SQLite 连接由工作线程与命令层共享，Schema 带版本号并按序迁移。

use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::now_iso8601;
use crate::paths::PathProvider;
use crate::utils::error::{AppError, AppResult};

use super::schema::{INIT_SCHEMA, MIGRATIONS, SCHEMA_VERSION};

/// 相册库
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Database {
    /// 打开或创建数据库文件
    pub fn open(path: PathBuf) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;
        tracing::debug!("打开相册库: {:?}", path);
        Self::wrap(conn, path)
    }

    /// 使用 PathProvider 打开数据库
    pub fn open_with_provider(provider: &dyn PathProvider) -> AppResult<Self> {
        Self::open(provider.database_path())
    }

    /// 打开内存数据库（用于测试）
    pub fn open_in_memory() -> AppResult<Self> {
        Self::wrap(Connection::open_in_memory()?, PathBuf::from(":memory:"))
    }

    fn wrap(conn: Connection, path: PathBuf) -> AppResult<Self> {
        // 级联删除依赖 foreign_keys；工作线程与命令层共用连接，需要 busy_timeout
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// 建表或升级到当前版本
    pub fn init(&self) -> AppResult<()> {
        self.transaction(|conn| {
            match installed_version(conn)? {
                None => {
                    tracing::info!("创建相册库 Schema v{}", SCHEMA_VERSION);
                    conn.execute_batch(INIT_SCHEMA)?;
                    record_version(conn, SCHEMA_VERSION)?;
                }
                Some(current) => {
                    let pending = MIGRATIONS.iter().filter(|m| m.version > current);
                    for migration in pending {
                        tracing::info!("迁移 v{} -> v{}: {}", current, migration.version, migration.description);
                        conn.execute_batch(migration.sql)?;
                        record_version(conn, migration.version)?;
                    }
                }
            }
            Ok(())
        })
    }

    /// 获取连接；锁被毒化时返回错误
    pub fn connection(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AppError::General(format!("相册库连接锁已损坏: {}", e)))
    }

    /// 在事务中执行；闭包返回错误时回滚
    pub fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// 各表行数与文件大小
    pub fn stats(&self) -> AppResult<DatabaseStats> {
        let conn = self.connection()?;
        let count = |table: &str| -> AppResult<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?)
        };

        Ok(DatabaseStats {
            album_count: count("albums")?,
            wallpaper_count: count("wallpapers")?,
            folder_count: count("folders")?,
            selected_count: count("selected_albums")?,
            db_size: std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0),
        })
    }
}

/// 已安装的 Schema 版本；全新数据库返回 None
fn installed_version(conn: &Connection) -> AppResult<Option<i32>> {
    let has_table: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(None);
    }

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(Some(version.unwrap_or(0)))
}

fn record_version(conn: &Connection, version: i32) -> AppResult<()> {
    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![version, now_iso8601()],
    )?;
    Ok(())
}

/// 相册库统计
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub album_count: i64,
    pub wallpaper_count: i64,
    pub folder_count: i64,
    pub selected_count: i64,
    /// 文件大小（字节）；内存库为 0
    pub db_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_in_memory_database_is_empty() {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(
            (stats.album_count, stats.wallpaper_count, stats.selected_count, stats.db_size),
            (0, 0, 0, 0)
        );
    }

    #[test]
    fn test_all_tables_are_created() {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();

        let conn = db.connection().unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for table in ["albums", "wallpapers", "folders", "selected_albums", "schema_version"] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_init_is_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("db").join("paperize.db");

        let db = Database::open(path.clone()).unwrap();
        db.init().unwrap();
        drop(db);

        let reopened = Database::open(path).unwrap();
        reopened.init().unwrap();

        let conn = reopened.connection().unwrap();
        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();

        let result: AppResult<()> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO albums (initial_album_name, display_name, date_created) VALUES ('a', 'a', '2024-01-01T00:00:00')",
                [],
            )?;
            Err(AppError::General("abort".to_string()))
        });
        assert!(result.is_err());

        assert_eq!(db.stats().unwrap().album_count, 0);
    }
}
