//! 引擎错误类型与命令层错误码

use serde::Serialize;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 图像处理错误
    #[error("图像处理错误: {0}")]
    Image(#[from] image::ImageError),

    /// JSON 序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 路径无效
    #[error("路径无效: {0}")]
    InvalidPath(String),

    /// 文件未找到
    #[error("文件未找到: {0}")]
    FileNotFound(String),

    /// 壁纸内容已无法解析（文件被删除、权限被撤销）
    #[error("壁纸内容不可用: {0}")]
    ContentUnavailable(String),

    /// 相册已没有任何壁纸
    #[error("相册为空: {0}")]
    EmptyAlbum(String),

    /// 解码 / 变换失败
    #[error("渲染失败: {0}")]
    Render(String),

    /// 系统拒绝设置壁纸
    #[error("设置壁纸失败: {0}")]
    Apply(String),

    /// 已启用轮换但目标没有可用相册
    #[error("配置不完整: {0}")]
    ConfigurationIncomplete(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 通用错误
    #[error("{0}")]
    General(String),
}

impl AppError {
    /// 是否属于“候选壁纸无效”类错误（按驱逐处理）
    pub fn is_content_failure(&self) -> bool {
        matches!(
            self,
            AppError::ContentUnavailable(_)
                | AppError::Render(_)
                | AppError::Apply(_)
                | AppError::Image(_)
                | AppError::FileNotFound(_)
        )
    }
}

/// 命令层错误：稳定的错误码 + 可读信息
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        let code = match &err {
            AppError::Database(_) => "E_DB_ERROR",
            AppError::Io(_) => "E_IO_ERROR",
            AppError::Image(_) => "E_IMAGE_ERROR",
            AppError::Json(_) => "E_JSON_ERROR",
            AppError::InvalidPath(_) => "E_PATH_INVALID",
            AppError::FileNotFound(_) => "E_FILE_NOT_FOUND",
            AppError::ContentUnavailable(_) => "E_CONTENT_UNAVAILABLE",
            AppError::EmptyAlbum(_) => "E_EMPTY_ALBUM",
            AppError::Render(_) => "E_RENDER",
            AppError::Apply(_) => "E_APPLY",
            AppError::ConfigurationIncomplete(_) => "E_CONFIG_INCOMPLETE",
            AppError::Config(_) => "E_CONFIG",
            AppError::General(_) => "E_GENERAL",
        };

        CommandError {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

/// 应用程序结果类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::EmptyAlbum("风景".to_string());
        assert_eq!(err.to_string(), "相册为空: 风景");
    }

    #[test]
    fn test_command_error_conversion() {
        let err = AppError::ConfigurationIncomplete("lock".to_string());
        let cmd_err: CommandError = err.into();
        assert_eq!(cmd_err.code, "E_CONFIG_INCOMPLETE");
    }

    #[test]
    fn test_content_failure_grouping() {
        assert!(AppError::Render("decode".into()).is_content_failure());
        assert!(AppError::Apply("rejected".into()).is_content_failure());
        assert!(AppError::ContentUnavailable("gone".into()).is_content_failure());
        assert!(!AppError::EmptyAlbum("a".into()).is_content_failure());
        assert!(!AppError::General("x".into()).is_content_failure());
    }
}
