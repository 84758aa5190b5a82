use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::error::{LogReaderError, Result};

/// Default per-file byte cap.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 200_000;

/// Settings files looked up in the launch directory when none is given explicitly.
pub const SETTINGS_CANDIDATES: &[&str] = &["logreader.yaml", "logreader.yml", "logreader.json"];

#[cfg(windows)]
const WELL_KNOWN_LOG_DIRS: &[&str] = &[r"C:\Logs", r"C:\Windows\System32\LogFiles"];

#[cfg(not(windows))]
const WELL_KNOWN_LOG_DIRS: &[&str] = &["/var/log"];

/// 搜索配置：候选根路径（有序）与单文件读取上限。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub log_paths: Vec<PathBuf>,
    pub max_file_size: u64,
}

impl SearchConfig {
    /// Builds a config, rejecting an empty root list or a zero byte cap.
    pub fn new(log_paths: Vec<PathBuf>, max_file_size: u64) -> Result<Self> {
        if log_paths.is_empty() {
            return Err(LogReaderError::ConfigError("log_paths must not be empty".into()));
        }
        if max_file_size == 0 {
            return Err(LogReaderError::ConfigError("max_file_size must be > 0".into()));
        }
        Ok(Self {
            log_paths,
            max_file_size,
        })
    }

    pub fn defaults_for(cwd: &Path) -> Self {
        Self {
            log_paths: default_log_paths(cwd),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

fn default_log_paths(cwd: &Path) -> Vec<PathBuf> {
    let mut paths = vec![cwd.join("logs"), cwd.to_path_buf()];
    paths.extend(WELL_KNOWN_LOG_DIRS.iter().map(PathBuf::from));
    paths
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
    #[default]
    Stdio,
    Http,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub mode: ServerMode,
    pub http_addr: String,
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: ServerMode::Stdio,
            http_addr: "127.0.0.1".to_string(),
            http_port: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub search: SearchConfig,
    pub server: ServerConfig,
}

impl Config {
    pub fn defaults_for(cwd: &Path) -> Self {
        Self {
            search: SearchConfig::defaults_for(cwd),
            server: ServerConfig::default(),
        }
    }

    /// Resolves the process configuration against the current working directory.
    /// Never fails: anything wrong with the settings source falls back to defaults.
    pub fn resolve(settings: Option<&Path>) -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::resolve_in(settings, &cwd)
    }

    pub fn resolve_in(settings: Option<&Path>, cwd: &Path) -> Self {
        let path = match settings {
            Some(p) => Some(absolutize(p, cwd)),
            None => locate_settings(cwd),
        };
        let Some(path) = path else {
            debug!("no settings source found, using defaults");
            return Self::defaults_for(cwd);
        };

        match load_settings(&path) {
            Ok(doc) => {
                info!("loaded settings from {}", path.display());
                Self::from_document(&doc, cwd)
            }
            Err(e) => {
                warn!("ignoring settings source {}: {e}", path.display());
                Self::defaults_for(cwd)
            }
        }
    }

    /// Builds a config from an already-parsed settings mapping. Each recognized
    /// key is validated on its own; a bad key only resets that key.
    pub fn from_document(doc: &Value, cwd: &Path) -> Self {
        let mut cfg = Self::defaults_for(cwd);
        if !doc.is_mapping() {
            warn!("settings document is not a mapping, using defaults");
            return cfg;
        }

        if let Some(raw) = doc.get("log_paths") {
            match parse_log_paths(raw, cwd) {
                Some(paths) => cfg.search.log_paths = paths,
                None => warn!("invalid log_paths, using defaults"),
            }
        }
        if let Some(raw) = doc.get("max_file_size") {
            match raw.as_u64().filter(|n| *n > 0) {
                Some(n) => cfg.search.max_file_size = n,
                None => warn!("invalid max_file_size {raw:?}, using {DEFAULT_MAX_FILE_SIZE}"),
            }
        }
        if let Some(raw) = doc.get("server") {
            cfg.server = parse_server(raw);
        }
        cfg
    }
}

fn locate_settings(cwd: &Path) -> Option<PathBuf> {
    SETTINGS_CANDIDATES
        .iter()
        .map(|name| cwd.join(name))
        .find(|p| p.is_file())
}

fn load_settings(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)?;
    let is_json = matches!(path.extension().and_then(|s| s.to_str()), Some("json"));
    if is_json {
        serde_json::from_str(&text).map_err(|e| LogReaderError::ConfigError(e.to_string()))
    } else {
        serde_yaml::from_str(&text).map_err(|e| LogReaderError::ConfigError(e.to_string()))
    }
}

fn parse_log_paths(raw: &Value, cwd: &Path) -> Option<Vec<PathBuf>> {
    let items = raw.as_sequence()?;
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| {
            item.as_str()
                .filter(|s| !s.trim().is_empty())
                .map(|s| absolutize(Path::new(s), cwd))
        })
        .collect()
}

fn parse_server(raw: &Value) -> ServerConfig {
    let mut server = ServerConfig::default();
    if !raw.is_mapping() {
        warn!("invalid server section, using defaults");
        return server;
    }

    if let Some(mode) = raw.get("mode") {
        match serde_yaml::from_value::<ServerMode>(mode.clone()) {
            Ok(m) => server.mode = m,
            Err(e) => warn!("invalid server.mode: {e}"),
        }
    }
    if let Some(addr) = raw.get("http_addr") {
        match addr.as_str().filter(|s| !s.is_empty()) {
            Some(a) => server.http_addr = a.to_string(),
            None => warn!("invalid server.http_addr {addr:?}"),
        }
    }
    if let Some(port) = raw.get("http_port") {
        match port
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .filter(|p| *p > 0)
        {
            Some(p) => server.http_port = p,
            None => warn!("invalid server.http_port {port:?}"),
        }
    }
    server
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn defaults_start_with_cwd_logs_then_cwd() {
        let cwd = Path::new("/srv/app");
        let cfg = SearchConfig::defaults_for(cwd);
        assert_eq!(cfg.log_paths[0], cwd.join("logs"));
        assert_eq!(cfg.log_paths[1], cwd.to_path_buf());
        assert!(cfg.log_paths.len() > 2);
        assert_eq!(cfg.max_file_size, 200_000);
    }

    #[test]
    fn new_rejects_empty_roots_and_zero_cap() {
        assert!(SearchConfig::new(vec![], 10).is_err());
        assert!(SearchConfig::new(vec![PathBuf::from("/tmp")], 0).is_err());
        assert!(SearchConfig::new(vec![PathBuf::from("/tmp")], 1).is_ok());
    }

    #[test]
    fn fields_fall_back_independently() {
        let cwd = Path::new("/srv/app");
        let cfg = Config::from_document(&doc("log_paths: [logs, /opt/x]\nmax_file_size: -5\n"), cwd);
        assert_eq!(
            cfg.search.log_paths,
            vec![cwd.join("logs"), PathBuf::from("/opt/x")]
        );
        assert_eq!(cfg.search.max_file_size, DEFAULT_MAX_FILE_SIZE);

        let cfg = Config::from_document(&doc("log_paths: [1, 2]\nmax_file_size: 42\n"), cwd);
        assert_eq!(cfg.search.log_paths, default_log_paths(cwd));
        assert_eq!(cfg.search.max_file_size, 42);
    }

    #[test]
    fn empty_log_paths_is_invalid() {
        let cwd = Path::new("/srv/app");
        let cfg = Config::from_document(&doc("log_paths: []\n"), cwd);
        assert_eq!(cfg.search.log_paths, default_log_paths(cwd));
    }

    #[test]
    fn server_section_parses_each_key() {
        let cwd = Path::new("/srv/app");
        let cfg = Config::from_document(
            &doc("server:\n  mode: both\n  http_addr: 0.0.0.0\n  http_port: 99999\n"),
            cwd,
        );
        assert_eq!(cfg.server.mode, ServerMode::Both);
        assert_eq!(cfg.server.http_addr, "0.0.0.0");
        assert_eq!(cfg.server.http_port, 3000);
        assert_eq!(cfg.search, SearchConfig::defaults_for(cwd));
    }

    #[test]
    fn settings_are_discovered_in_launch_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("logreader.json"),
            r#"{"log_paths": ["var"], "max_file_size": 1024}"#,
        )
        .unwrap();

        let cfg = Config::resolve_in(None, dir.path());
        assert_eq!(cfg.search.log_paths, vec![dir.path().join("var")]);
        assert_eq!(cfg.search.max_file_size, 1024);
    }

    #[test]
    fn missing_settings_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let cfg = Config::resolve_in(Some(&missing), dir.path());
        assert_eq!(cfg, Config::defaults_for(dir.path()));
    }
}
