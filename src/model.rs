use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ReadFailure, Result};

/// 单个文件的扫描结果：路径 + 读取结果（成功内容或错误描述）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(serialize_with = "serialize_lossy_path")]
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileOutcome {
    Read { content: String, truncated: bool },
    Failed { error: String },
}

impl FileRecord {
    pub fn read(path: PathBuf, content: String, truncated: bool) -> Self {
        Self {
            path,
            outcome: FileOutcome::Read { content, truncated },
        }
    }

    pub fn failed(path: PathBuf, failure: &ReadFailure) -> Self {
        Self {
            path,
            outcome: FileOutcome::Failed {
                error: failure.to_string(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }
}

/// Records in discovery order. Overlapping roots may report a file twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub files: Vec<FileRecord>,
}

impl ScanResult {
    /// Serialized payload handed back to tool callers.
    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Non-UTF-8 names are written with U+FFFD instead of failing the whole payload.
fn serialize_lossy_path<S>(path: &Path, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&path.to_string_lossy())
}
