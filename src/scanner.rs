use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::SearchConfig;
use crate::model::{FileRecord, ScanResult};
use crate::reader::FileReader;

/// 日志扫描器：遍历配置的根路径，按文件名子串过滤并读取内容。
///
/// Stateless between calls: every `scan` walks the filesystem afresh.
#[derive(Debug, Clone)]
pub struct LogScanner {
    config: SearchConfig,
    reader: FileReader,
    fallback_root: PathBuf,
}

impl LogScanner {
    /// Falls back to the current working directory when no configured root exists.
    pub fn new(config: SearchConfig) -> Self {
        let fallback_root = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_fallback_root(config, fallback_root)
    }

    pub fn with_fallback_root(config: SearchConfig, fallback_root: PathBuf) -> Self {
        Self {
            reader: FileReader::new(config.max_file_size),
            config,
            fallback_root,
        }
    }

    /// Configured roots that exist right now, in configured order.
    pub fn select_roots(&self) -> Vec<PathBuf> {
        let existing: Vec<PathBuf> = self
            .config
            .log_paths
            .iter()
            .filter(|p| p.exists())
            .cloned()
            .collect();
        if existing.is_empty() {
            debug!(
                "no configured root exists, falling back to {}",
                self.fallback_root.display()
            );
            return vec![self.fallback_root.clone()];
        }
        existing
    }

    /// Runs one full discovery pass. `term` is a case-sensitive substring of the
    /// file's base name; `None` or empty matches everything.
    pub fn scan(&self, term: Option<&str>) -> ScanResult {
        let term = term.unwrap_or_default();
        let mut files = Vec::new();

        for root in self.select_roots() {
            if root.is_file() {
                let name = root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if name_matches(&name, term) {
                    files.push(self.read_record(root));
                }
                continue;
            }
            self.scan_dir(&root, term, &mut files);
        }

        debug!("scan for {:?} produced {} records", term, files.len());
        ScanResult { files }
    }

    fn scan_dir(&self, root: &Path, term: &str, out: &mut Vec<FileRecord>) {
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping unreadable entry under {}: {e}", root.display());
                    continue;
                }
            };
            if !is_candidate(&entry) {
                continue;
            }
            if name_matches(&entry.file_name().to_string_lossy(), term) {
                out.push(self.read_record(entry.into_path()));
            }
        }
    }

    fn read_record(&self, path: PathBuf) -> FileRecord {
        match self.reader.read_capped(&path) {
            Ok(read) => FileRecord::read(path, read.content, read.truncated),
            Err(failure) => {
                debug!("failed to read {}: {failure}", path.display());
                FileRecord::failed(path, &failure)
            }
        }
    }
}

pub fn name_matches(name: &str, term: &str) -> bool {
    term.is_empty() || name.contains(term)
}

/// Regular files, plus symlinks to regular files. Dangling links are kept and
/// surface as failure records. Directories below the root are walked, never
/// reported; symlinked directories are not entered.
fn is_candidate(entry: &DirEntry) -> bool {
    let ft = entry.file_type();
    if ft.is_file() {
        return true;
    }
    if ft.is_symlink() {
        return match fs::metadata(entry.path()) {
            Ok(target) => target.is_file(),
            Err(_) => true,
        };
    }
    if !ft.is_dir() {
        debug!("skipping special file {}", entry.path().display());
    }
    false
}
