//! 配置模块，负责加载命令行工具的JSON配置文件

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置文件错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(PathBuf),

    #[error("无法读取配置文件 {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("无法解析JSON配置文件 {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 命令行工具的设置, 所有字段都可省略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 输出格式化的 JSON
    pub pretty: bool,
    /// 在 JSON 之后输出由配置重新生成的 InfluxQL
    pub render: bool,
    /// REPL 历史记录文件, 为空时不保存历史
    pub history_file: Option<PathBuf>,
    pub prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pretty: false,
            render: false,
            history_file: None,
            prompt: "influxql> ".to_string(),
        }
    }
}

impl Settings {
    /// 从JSON文件加载设置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 文件不存在时使用默认设置, 其他错误照常返回
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::from_json_file(path) {
            Err(ConfigError::NotFound(path)) => {
                tracing::warn!(path = %path.display(), "settings file not found, using defaults");
                Ok(Self::default())
            }
            result => result,
        }
    }
}
