//! Paperize 命令模块
//!
//! 命令行各子命令对应的操作，返回 `CommandError`

pub mod albums;
pub mod selection;
pub mod settings;
pub mod triggers;

pub use albums::*;
pub use selection::*;
pub use settings::*;
pub use triggers::*;
