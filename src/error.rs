use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogReaderError>;

#[derive(Debug, Error)]
pub enum LogReaderError {
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("无效请求: {0}")]
    InvalidRequest(String),

    #[error("扫描任务失败: {0}")]
    ScanTask(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single file could not be read. The display text is what clients see
/// in the `error` field of a failure record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadFailure {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not a regular file")]
    NotAFile,

    #[error("read failed: {0}")]
    Io(String),
}

impl From<io::Error> for ReadFailure {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ReadFailure::NotFound(err.to_string()),
            io::ErrorKind::PermissionDenied => ReadFailure::PermissionDenied(err.to_string()),
            _ => ReadFailure::Io(err.to_string()),
        }
    }
}
