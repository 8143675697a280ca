// ==========================================
// 需求周同步工具 - 配置管理器
// ==========================================
// 职责: 配置加载（显式路径 → 用户配置目录 → 缺省值）与校验
// 存储: JSON 文件
// ==========================================

use crate::config::run_config::RunConfig;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// 配置目录下的应用子目录名
pub const APP_CONFIG_DIR: &str = "demand-sync";

/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "config.json";

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件格式错误 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置值无效 (key: {key}): {message}")]
    Invalid { key: String, message: String },
}

/// 配置来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: RunConfig,
    source: ConfigSource,
}

impl ConfigManager {
    /// 加载配置
    ///
    /// # 查找顺序
    /// 1. explicit 指定的文件（不存在即报错）
    /// 2. `<config_dir>/demand-sync/config.json`（存在才读取）
    /// 3. 缺省值
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("未找到配置文件，使用缺省配置");
                Ok(Self::with_defaults())
            }
        }
    }

    /// 从 JSON 文件读取配置
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: RunConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        validate(&config)?;
        info!(path = %path.display(), "配置文件加载完成");

        Ok(Self {
            config,
            source: ConfigSource::File(path.to_path_buf()),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: RunConfig::default(),
            source: ConfigSource::Defaults,
        }
    }

    /// 直接使用内存中的配置（测试/嵌入场景）
    pub fn from_config(config: RunConfig) -> Result<Self, ConfigError> {
        validate(&config)?;
        Ok(Self {
            config,
            source: ConfigSource::Defaults,
        })
    }

    /// 用户配置目录下的缺省配置文件路径
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_CONFIG_DIR).join(CONFIG_FILE_NAME))
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn into_config(self) -> RunConfig {
        self.config
    }
}

/// 校验配置：窗口宽度、正则可编译
fn validate(config: &RunConfig) -> Result<(), ConfigError> {
    if !config.grid.window_is_valid() {
        return Err(ConfigError::Invalid {
            key: "grid.window_cols".to_string(),
            message: format!(
                "窗口列数必须为 {}，实际 {}",
                crate::domain::record::WINDOW_WIDTH,
                config.grid.window_cols.len()
            ),
        });
    }

    for (key, pattern) in [
        ("matrix.anchor_pattern", &config.matrix.anchor_pattern),
        ("matrix.marker_pattern", &config.matrix.marker_pattern),
    ] {
        Regex::new(pattern).map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let manager = ConfigManager::from_config(RunConfig::default()).unwrap();
        assert_eq!(manager.config().grid.sheet_name, "EDI");
        assert_eq!(manager.config().grid.window_cols, vec![18, 20, 22, 24, 26]);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"{{ "output": {{ "item_order": ["A2238305705"] }}, "grid": {{ "sheet_name": "EDI2" }} }}"#
        )
        .unwrap();

        let manager = ConfigManager::from_file(temp_file.path()).unwrap();
        let config = manager.config();
        assert_eq!(config.output.item_order, vec!["A2238305705".to_string()]);
        assert_eq!(config.grid.sheet_name, "EDI2");
        assert_eq!(config.grid.backlog_col, 17);
        assert_eq!(config.matrix.sheet_name, "Zeitraum bis Bedarfsende");
        assert!(matches!(manager.source(), ConfigSource::File(_)));
    }

    #[test]
    fn test_invalid_window_rejected() {
        let mut config = RunConfig::default();
        config.grid.window_cols = vec![18, 20];
        let err = ConfigManager::from_config(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let mut config = RunConfig::default();
        config.matrix.marker_pattern = "(".to_string();
        assert!(ConfigManager::from_config(config).is_err());
    }

    #[test]
    fn test_malformed_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{ not json").unwrap();
        let err = ConfigManager::from_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigManager::load(Some(Path::new("does/not/exist.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
