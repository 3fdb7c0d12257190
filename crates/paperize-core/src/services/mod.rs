//! Paperize 服务模块
//!
//! 包含轮换引擎与各项外部能力的实现

pub mod applier;
pub mod controller;
pub mod queue;
pub mod refresher;
pub mod renderer;
pub mod resolver;
pub mod scanner;
pub mod scheduler;
pub mod settings;

// 重新导出常用类型
pub use applier::{FileWallpaperApplier, WallpaperApplier};
pub use controller::{ControllerDeps, Outcome, RotationController};
pub use queue::{Candidate, QueueManager};
pub use refresher::{AlbumRefresher, RefreshReport};
pub use renderer::{ImageRenderer, Renderer};
pub use resolver::{path_to_uri, ContentRef, ContentResolver, LocalContentResolver};
pub use scanner::{is_image_file, DirectoryScanner, FolderScanner, ScanOptions, SUPPORTED_FORMATS};
pub use scheduler::{JobHandler, RotationWorkers, TriggerScheduler};
pub use settings::{load_intervals, load_rotation_config, JsonSettingsStore, SettingsStore};
