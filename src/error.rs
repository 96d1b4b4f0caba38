use crate::protocol::RejectReason;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型。`Serialize`/`Deserialize` 让它能穿过 Tauri IPC 边界
/// 直接回传给前端，不需要额外的字符串化转换层。
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum AppError {
    #[error("IO错误: {0}")]
    Io(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("游戏逻辑错误: {0}")]
    GameLogic(String),

    #[error("未找到资源: {0}")]
    NotFound(String),

    /// 处理器层面的业务拒绝，携带完整的拒绝原因分类，供传输层按
    /// `RejectReason` 做对应的 UI 展示而不是解析字符串。
    #[error("动作被拒绝: {0:?}")]
    Rejection(RejectReason),

    #[error("未知错误: {0}")]
    Unknown(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<crate::handlers::Rejection> for AppError {
    fn from(rejection: crate::handlers::Rejection) -> Self {
        AppError::Rejection(rejection.reason)
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
