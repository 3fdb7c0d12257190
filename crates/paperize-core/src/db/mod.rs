//! Paperize 数据库模块
//!
//! 包含数据库连接管理和数据访问层

pub mod album_dao;
pub mod connection;
pub mod repository;
pub mod schema;
pub mod selected_album_dao;

// 重新导出常用类型
pub use connection::{Database, DatabaseStats};
pub use repository::{AlbumRepository, SelectedAlbumRepository};
